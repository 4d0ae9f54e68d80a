//! Pitch index constants for the 88 piano keys, sharps spelling.
//!
//! Index 0 (`NA0`) is the lowest A on a piano. Not every index is
//! reachable on every sound chip; the chip driver clamps or drops what
//! it cannot play. Pitch 127 is the reserved rest value.

/// Reserved pitch meaning silence for the note's duration.
pub const REST: u8 = 127;

/// Highest real pitch index (0-126); 127 is [`REST`].
pub const MAX_PITCH: u8 = 126;

pub const NA0: u8 = 0;
pub const NA0S: u8 = 1;
pub const NB0: u8 = 2;

pub const NC1: u8 = 3;
pub const NC1S: u8 = 4;
pub const ND1: u8 = 5;
pub const ND1S: u8 = 6;
pub const NE1: u8 = 7;
pub const NF1: u8 = 8;
pub const NF1S: u8 = 9;
pub const NG1: u8 = 10;
pub const NG1S: u8 = 11;
pub const NA1: u8 = 12;
pub const NA1S: u8 = 13;
pub const NB1: u8 = 14;

pub const NC2: u8 = 15;
pub const NC2S: u8 = 16;
pub const ND2: u8 = 17;
pub const ND2S: u8 = 18;
pub const NE2: u8 = 19;
pub const NF2: u8 = 20;
pub const NF2S: u8 = 21;
pub const NG2: u8 = 22;
pub const NG2S: u8 = 23;
pub const NA2: u8 = 24;
pub const NA2S: u8 = 25;
pub const NB2: u8 = 26;

pub const NC3: u8 = 27;
pub const NC3S: u8 = 28;
pub const ND3: u8 = 29;
pub const ND3S: u8 = 30;
pub const NE3: u8 = 31;
pub const NF3: u8 = 32;
pub const NF3S: u8 = 33;
pub const NG3: u8 = 34;
pub const NG3S: u8 = 35;
pub const NA3: u8 = 36;
pub const NA3S: u8 = 37;
pub const NB3: u8 = 38;

pub const NC4: u8 = 39;
pub const NC4S: u8 = 40;
pub const ND4: u8 = 41;
pub const ND4S: u8 = 42;
pub const NE4: u8 = 43;
pub const NF4: u8 = 44;
pub const NF4S: u8 = 45;
pub const NG4: u8 = 46;
pub const NG4S: u8 = 47;
pub const NA4: u8 = 48;
pub const NA4S: u8 = 49;
pub const NB4: u8 = 50;

pub const NC5: u8 = 51;
pub const NC5S: u8 = 52;
pub const ND5: u8 = 53;
pub const ND5S: u8 = 54;
pub const NE5: u8 = 55;
pub const NF5: u8 = 56;
pub const NF5S: u8 = 57;
pub const NG5: u8 = 58;
pub const NG5S: u8 = 59;
pub const NA5: u8 = 60;
pub const NA5S: u8 = 61;
pub const NB5: u8 = 62;

pub const NC6: u8 = 63;
pub const NC6S: u8 = 64;
pub const ND6: u8 = 65;
pub const ND6S: u8 = 66;
pub const NE6: u8 = 67;
pub const NF6: u8 = 68;
pub const NF6S: u8 = 69;
pub const NG6: u8 = 70;
pub const NG6S: u8 = 71;
pub const NA6: u8 = 72;
pub const NA6S: u8 = 73;
pub const NB6: u8 = 74;

pub const NC7: u8 = 75;
pub const NC7S: u8 = 76;
pub const ND7: u8 = 77;
pub const ND7S: u8 = 78;
pub const NE7: u8 = 79;
pub const NF7: u8 = 80;
pub const NF7S: u8 = 81;
pub const NG7: u8 = 82;
pub const NG7S: u8 = 83;
pub const NA7: u8 = 84;
pub const NA7S: u8 = 85;
pub const NB7: u8 = 86;

pub const NC8: u8 = 87;

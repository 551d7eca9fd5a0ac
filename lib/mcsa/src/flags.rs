use std::ops::Index;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Flag {
    Skeleton = 0,
    Uv = 1,
    Normals = 2,
    Flag4 = 3,
    Flag5 = 4,
    Flag6 = 5,
}

pub const MAX_FLAGS: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Version {
    V7,
    V8,
    V10,
}

impl Version {
    pub fn from_raw(raw: f32) -> Option<Self> {
        if raw == 7.0 {
            Some(Version::V7)
        } else if raw == 8.0 {
            Some(Version::V8)
        } else if raw == 10.0 {
            Some(Version::V10)
        } else {
            None
        }
    }

    /// Number of flag bytes stored in the header.
    pub fn flag_count(self) -> usize {
        match self {
            Version::V7 => 4,
            Version::V8 => 5,
            Version::V10 => 6,
        }
    }
}

/// Header flags; entries beyond the version's count stay unset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flags {
    bits: [bool; MAX_FLAGS],
}

impl Flags {
    pub fn set(&mut self, index: usize, value: bool) {
        self.bits[index] = value;
    }
}

impl Index<Flag> for Flags {
    type Output = bool;

    fn index(&self, flag: Flag) -> &bool {
        &self.bits[flag as usize]
    }
}

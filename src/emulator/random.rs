//! The random-byte collaborator used by CXNN.

/// A source of uniformly distributed bytes.
pub trait RandomSource {
    fn random_byte(&mut self) -> u8;
}

/// The default source, backed by the thread-local generator from `rand`.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn random_byte(&mut self) -> u8 {
        rand::random::<u8>()
    }
}

/// A deterministic source for tests: replays a fixed sequence, then repeats
/// the last value.
pub struct FixedRandom {
    values: Vec<u8>,
    next: usize,
}

impl FixedRandom {
    pub fn new(values: &[u8]) -> FixedRandom {
        FixedRandom {
            values: values.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for FixedRandom {
    fn random_byte(&mut self) -> u8 {
        let value = self.values[self.next.min(self.values.len() - 1)];
        self.next += 1;
        value
    }
}

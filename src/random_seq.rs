use crate::common::Sequence;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// generate random lowercase bases of given length from seed
///
pub fn generate(length: usize, seed: u64) -> Sequence {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    generate_with(length, &mut rng)
}

///
/// generate random lowercase bases of given length with the rng
///
pub fn generate_with<R: Rng>(length: usize, rng: &mut R) -> Sequence {
    let bases = [b'a', b'c', b'g', b't'];
    (0..length)
        .map(|_| bases[rng.gen_range(0..bases.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::sequence_to_string;

    #[test]
    fn random_seq() {
        let s = generate(50, 0);
        println!("{:?}", sequence_to_string(&s));
        assert_eq!(s.len(), 50);
        assert!(s.iter().all(|b| b"acgt".contains(b)));
        // deterministic
        assert_eq!(s, generate(50, 0));
        assert_ne!(s, generate(50, 11));
    }
}

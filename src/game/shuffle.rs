use rand::Rng;

/// Return a uniformly random permutation of `items`, leaving the input untouched.
///
/// Standard backward Fisher-Yates: for each index from the last down to 1,
/// swap it with a uniformly chosen index in `0..=i`.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();

    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }

    shuffled
}

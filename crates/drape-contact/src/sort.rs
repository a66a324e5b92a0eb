//! Introsort over a slice keyed by a scalar.
//!
//! Quicksort with a median-of-three pivot down to sub-ranges of
//! [`INSERTION_THRESHOLD`] elements, falling back to heapsort once the
//! recursion depth exceeds `2·log2(n)`. A single insertion-sort pass
//! finishes the nearly-sorted result.

const INSERTION_THRESHOLD: usize = 16;

/// Sorts `v` ascending by `key`. Not stable.
pub fn introsort<T, F>(v: &mut [T], key: F)
where
    F: Fn(&T) -> f32,
{
    if v.len() < 2 {
        return;
    }
    let log2 = (usize::BITS - 1 - v.len().leading_zeros()) as usize;
    quicksort(v, &key, 2 * log2);
    insertion_sort(v, &key);
}

fn quicksort<T, F>(mut v: &mut [T], key: &F, mut depth: usize)
where
    F: Fn(&T) -> f32,
{
    while v.len() > INSERTION_THRESHOLD {
        if depth == 0 {
            heapsort(v, key);
            return;
        }
        depth -= 1;

        let p = partition(v, key);
        let (left, right) = std::mem::take(&mut v).split_at_mut(p);
        let right = &mut right[1..];
        // Recurse into the smaller side, loop on the larger.
        if left.len() < right.len() {
            quicksort(left, key, depth);
            v = right;
        } else {
            quicksort(right, key, depth);
            v = left;
        }
    }
}

/// Lomuto partition around the median of first, middle and last.
/// Returns the pivot's final index.
fn partition<T, F>(v: &mut [T], key: &F) -> usize
where
    F: Fn(&T) -> f32,
{
    let last = v.len() - 1;
    let mid = v.len() / 2;
    if key(&v[mid]) < key(&v[0]) {
        v.swap(mid, 0);
    }
    if key(&v[last]) < key(&v[0]) {
        v.swap(last, 0);
    }
    if key(&v[last]) < key(&v[mid]) {
        v.swap(last, mid);
    }
    v.swap(mid, last);

    let pivot = key(&v[last]);
    let mut store = 0;
    for i in 0..last {
        if key(&v[i]) < pivot {
            v.swap(i, store);
            store += 1;
        }
    }
    v.swap(store, last);
    store
}

fn heapsort<T, F>(v: &mut [T], key: &F)
where
    F: Fn(&T) -> f32,
{
    let n = v.len();
    for start in (0..n / 2).rev() {
        sift_down(v, key, start, n);
    }
    for end in (1..n).rev() {
        v.swap(0, end);
        sift_down(v, key, 0, end);
    }
}

fn sift_down<T, F>(v: &mut [T], key: &F, mut root: usize, end: usize)
where
    F: Fn(&T) -> f32,
{
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && key(&v[child]) < key(&v[child + 1]) {
            child += 1;
        }
        if key(&v[root]) >= key(&v[child]) {
            return;
        }
        v.swap(root, child);
        root = child;
    }
}

fn insertion_sort<T, F>(v: &mut [T], key: &F)
where
    F: Fn(&T) -> f32,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && key(&v[j]) < key(&v[j - 1]) {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}

//! In-place partition-exchange sort used to order a run before it is stored.
//!
//! Lomuto partitioning with the last element of the range as pivot. Recursion
//! goes into the smaller side and the larger side is handled by the loop, so
//! stack depth stays logarithmic even when the run is already sorted (time is
//! still quadratic in that case).

/// Sort `arr` ascending in place.
pub fn quick_sort(arr: &mut [u32]) {
    if arr.len() > 1 {
        sort_range(arr, 0, arr.len() - 1);
    }
}

/// Sort the inclusive index range `[low, high]` of `arr`.
pub fn sort_range(arr: &mut [u32], mut low: usize, mut high: usize) {
    while low < high {
        let pivot = partition(arr, low, high);
        if pivot - low < high - pivot {
            if pivot > low {
                sort_range(arr, low, pivot - 1);
            }
            low = pivot + 1;
        } else {
            sort_range(arr, pivot + 1, high);
            if pivot == 0 {
                break;
            }
            high = pivot - 1;
        }
    }
}

/// Partition `[low, high]` around `arr[high]` and return the pivot's final index.
///
/// Every element scanned that is `<= pivot` is moved to the left block.
pub fn partition(arr: &mut [u32], low: usize, high: usize) -> usize {
    let pivot = arr[high];
    let mut store = low;
    for j in low..high {
        if arr[j] <= pivot {
            arr.swap(store, j);
            store += 1;
        }
    }
    arr.swap(store, high);
    store
}

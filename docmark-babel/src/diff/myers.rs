//! Myers' O(ND) shortest edit script over arbitrary tokens.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Equal { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

/// Shortest edit script turning `old` into `new`, in sequence order.
/// Deletions are placed before insertions inside each changed region.
pub fn diff<T>(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<Edit> {
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    let offset = max + 1;
    let at = |k: isize| (k + offset) as usize;

    let mut v = vec![0isize; (2 * max + 3) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
                v[at(k + 1)]
            } else {
                v[at(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && eq(&old[x as usize], &new[y as usize]) {
                x += 1;
                y += 1;
            }
            v[at(k)] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut edits = Vec::with_capacity((n.max(m)) as usize);
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let previous_k = if k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let previous_x = v[at(previous_k)];
        let previous_y = previous_x - previous_k;

        while x > previous_x && y > previous_y {
            edits.push(Edit::Equal {
                old: (x - 1) as usize,
                new: (y - 1) as usize,
            });
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == previous_x {
                edits.push(Edit::Insert {
                    new: (y - 1) as usize,
                });
            } else {
                edits.push(Edit::Delete {
                    old: (x - 1) as usize,
                });
            }
        }
        x = previous_x;
        y = previous_y;
    }
    edits.reverse();
    group_changes(edits)
}

/// Reorders each maximal run of non-equal edits so deletions come first.
fn group_changes(edits: Vec<Edit>) -> Vec<Edit> {
    let mut out = Vec::with_capacity(edits.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();
    for edit in edits {
        match edit {
            Edit::Delete { .. } => deletes.push(edit),
            Edit::Insert { .. } => inserts.push(edit),
            Edit::Equal { .. } => {
                out.append(&mut deletes);
                out.append(&mut inserts);
                out.push(edit);
            }
        }
    }
    out.append(&mut deletes);
    out.append(&mut inserts);
    out
}

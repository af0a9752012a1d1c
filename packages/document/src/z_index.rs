//! # Fractional Z-Index Keys
//!
//! Stacking order is a plain string compared byte-wise. A new key can always
//! be generated strictly between two existing keys, so inserting a shape never
//! renumbers its neighbours.
//!
//! ## Key format
//!
//! ```text
//!   a 0 V
//!   │ │ └── fraction (base-62, never ends in '0')
//!   │ └──── integer digits (count encoded by the head)
//!   └────── head: 'a'..='z' → 1..=26 digits, 'Z'..='A' → 1..=26 digits, negative side
//! ```
//!
//! Appending or prepending only bumps the integer part, so keys grow
//! logarithmically with the number of items added at either end. Inserting
//! between two keys extends the fraction.
//!
//! Any non-empty string is a valid key: documents written elsewhere may carry
//! keys like `"b0"` that do not follow this format. When a bound is not in the
//! format, generation bisects digit by digit over the raw strings instead.

use crate::DocumentError;

const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ZERO: u8 = b'0';
const LAST_DIGIT: u8 = b'z';

/// Lowest representable integer part. A key must be strictly greater.
const SMALLEST_INTEGER: &str = "A00000000000000000000000000";

/// Key used when nothing exists yet.
pub const INITIAL_KEY: &str = "a0";

pub type KeyResult<T> = Result<T, DocumentError>;

/// Generate a key that sorts strictly between `before` and `after`.
///
/// A `None` bound is open: `key_between(Some(k), None)` is above `k`,
/// `key_between(None, Some(k))` is below it, and `key_between(None, None)`
/// returns [`INITIAL_KEY`].
pub fn key_between(before: Option<&str>, after: Option<&str>) -> KeyResult<String> {
    if let Some(a) = before {
        validate_key(a)?;
    }
    if let Some(b) = after {
        validate_key(b)?;
    }
    if let (Some(a), Some(b)) = (before, after) {
        if a >= b {
            return Err(DocumentError::KeyOrder {
                before: a.to_string(),
                after: b.to_string(),
            });
        }
    }

    let canonical = before.map_or(true, is_canonical_key) && after.map_or(true, is_canonical_key);
    if canonical {
        return canonical_between(before, after);
    }

    // Open ends jump back into the generated format so later appends stay short
    let reentry = match (before, after) {
        (Some(a), None) => integer_prefix(a).and_then(|int| increment_integer(&int).ok().flatten()),
        (None, Some(b)) => integer_prefix(b).and_then(|int| decrement_integer(&int).ok().flatten()),
        _ => None,
    };
    if let Some(key) = reentry.filter(|key| key != SMALLEST_INTEGER) {
        return Ok(key);
    }

    let a: Vec<char> = before.unwrap_or_default().chars().collect();
    let b: Option<Vec<char>> = after.map(|b| b.chars().collect());
    free_between(&a, b.as_deref())
        .map(|key| key.into_iter().collect())
        .ok_or(DocumentError::KeyExhausted)
}

fn canonical_between(before: Option<&str>, after: Option<&str>) -> KeyResult<String> {
    match (before, after) {
        (None, None) => Ok(INITIAL_KEY.to_string()),

        (None, Some(b)) => {
            let int_b = integer_part(b)?;
            let frac_b = &b[int_b.len()..];
            if int_b == SMALLEST_INTEGER {
                let mid = midpoint(b"", Some(frac_b.as_bytes()));
                return Ok(join(int_b, &mid));
            }
            if int_b < b {
                return Ok(int_b.to_string());
            }
            decrement_integer(int_b)?.ok_or(DocumentError::KeyExhausted)
        }

        (Some(a), None) => {
            let int_a = integer_part(a)?;
            let frac_a = &a[int_a.len()..];
            match increment_integer(int_a)? {
                Some(next) => Ok(next),
                None => Ok(join(int_a, &midpoint(frac_a.as_bytes(), None))),
            }
        }

        (Some(a), Some(b)) => {
            let int_a = integer_part(a)?;
            let frac_a = &a[int_a.len()..];
            let int_b = integer_part(b)?;
            let frac_b = &b[int_b.len()..];

            if int_a == int_b {
                let mid = midpoint(frac_a.as_bytes(), Some(frac_b.as_bytes()));
                return Ok(join(int_a, &mid));
            }

            let next = increment_integer(int_a)?.ok_or(DocumentError::KeyExhausted)?;
            if next.as_str() < b {
                Ok(next)
            } else {
                Ok(join(int_a, &midpoint(frac_a.as_bytes(), None)))
            }
        }
    }
}

/// Key strictly between two arbitrary strings (`a` may be empty, `b = None`
/// is unbounded), built from the digit alphabet.
///
/// `None` when no such key exists, e.g. below `"0"`.
fn free_between(a: &[char], b: Option<&[char]>) -> Option<Vec<char>> {
    let Some(b) = b else {
        return Some(above(a));
    };

    let shared = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let upper = *b.get(shared)?;
    let lower = a.get(shared).copied();

    let mut key = b[..shared].to_vec();
    // Past the end of `a` a trailing '0' would leave no room below it
    if let Some(d) = digit_between(Some(lower.unwrap_or('0')), Some(upper)) {
        key.push(d);
        return Some(key);
    }
    match lower {
        Some(lower) => {
            key.push(lower);
            key.extend(above(&a[shared + 1..]));
        }
        None if upper > '0' => {
            key.push('0');
            key.extend(above(&[]));
        }
        None => {
            key.push(upper);
            key.extend(free_between(&[], Some(&b[shared + 1..]))?);
        }
    }
    Some(key)
}

/// Shortest-ish key strictly above `a`
fn above(a: &[char]) -> Vec<char> {
    let mut key = Vec::with_capacity(a.len() + 1);
    for &c in a {
        if let Some(d) = digit_between(Some(c), None) {
            key.push(d);
            return key;
        }
        key.push(c);
    }
    key.extend(digit_between(None, None));
    key
}

/// Middle digit strictly between two bounds, if any
fn digit_between(lower: Option<char>, upper: Option<char>) -> Option<char> {
    let candidates: Vec<char> = DIGITS
        .iter()
        .map(|&d| d as char)
        .filter(|&d| lower.map_or(true, |l| d > l) && upper.map_or(true, |u| d < u))
        .collect();
    candidates.get(candidates.len() / 2).copied()
}

/// Generate `n` ascending keys strictly between `before` and `after`.
///
/// Keys are spread by bisection so a paste of many shapes does not leave one
/// long tail of ever-growing fractions.
pub fn keys_between(before: Option<&str>, after: Option<&str>, n: usize) -> KeyResult<Vec<String>> {
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![key_between(before, after)?]),
        _ => {}
    }

    if after.is_none() {
        let mut keys = Vec::with_capacity(n);
        let mut current = key_between(before, after)?;
        for _ in 1..n {
            let next = key_between(Some(&current), after)?;
            keys.push(std::mem::replace(&mut current, next));
        }
        keys.push(current);
        return Ok(keys);
    }

    if before.is_none() {
        let mut keys = Vec::with_capacity(n);
        let mut current = key_between(before, after)?;
        for _ in 1..n {
            let next = key_between(before, Some(&current))?;
            keys.push(std::mem::replace(&mut current, next));
        }
        keys.push(current);
        keys.reverse();
        return Ok(keys);
    }

    let mid = n / 2;
    let pivot = key_between(before, after)?;
    let mut keys = keys_between(before, Some(&pivot), mid)?;
    let upper = keys_between(Some(&pivot), after, n - mid - 1)?;
    keys.push(pivot);
    keys.extend(upper);
    Ok(keys)
}

/// Sort `items` by a key extracted from each item.
///
/// The sort is stable: items with equal keys keep their incoming order.
pub fn ordered_by<T, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort_by(|a, b| key(a).cmp(key(b)));
    items
}

/// Check that `key` can be used as an order key: any non-empty string.
pub fn validate_key(key: &str) -> KeyResult<()> {
    if key.is_empty() {
        return Err(DocumentError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Whether `key` is in the format this module generates.
pub fn is_canonical_key(key: &str) -> bool {
    if key.is_empty() || !key.bytes().all(|c| DIGITS.contains(&c)) || key == SMALLEST_INTEGER {
        return false;
    }
    match integer_part(key) {
        Ok(int) => !key[int.len()..].ends_with(ZERO as char),
        Err(_) => false,
    }
}

fn digit(c: u8) -> usize {
    DIGITS.iter().position(|&d| d == c).unwrap_or(0)
}

fn join(int: &str, frac: &[u8]) -> String {
    let mut key = String::with_capacity(int.len() + frac.len());
    key.push_str(int);
    key.extend(frac.iter().map(|&c| c as char));
    key
}

fn integer_length(head: u8) -> Option<usize> {
    match head {
        b'a'..=b'z' => Some((head - b'a') as usize + 2),
        b'A'..=b'Z' => Some((b'Z' - head) as usize + 2),
        _ => None,
    }
}

/// Integer part implied by the head of a key outside the format: the digits
/// it starts with, padded with '0' to the length the head asks for
fn integer_prefix(key: &str) -> Option<String> {
    let len = integer_length(*key.as_bytes().first()?)?;
    let taken: Vec<u8> = key.bytes().take(len).collect();
    if !taken.iter().all(|c| DIGITS.contains(c)) {
        return None;
    }
    let mut int = join("", &taken);
    int.extend(std::iter::repeat(ZERO as char).take(len - taken.len()));
    Some(int)
}

fn integer_part(key: &str) -> KeyResult<&str> {
    let len = key
        .as_bytes()
        .first()
        .and_then(|&head| integer_length(head))
        .ok_or_else(|| DocumentError::InvalidKey(key.to_string()))?;
    if len > key.len() {
        return Err(DocumentError::InvalidKey(key.to_string()));
    }
    Ok(&key[..len])
}

/// Midpoint of two fractions. `b = None` means "up to 1".
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(ZERO) == b[n] {
            n += 1;
        }
        if n > 0 {
            let mut out = b[..n].to_vec();
            out.extend(midpoint(a.get(n..).unwrap_or(&[]), Some(&b[n..])));
            return out;
        }
    }

    let digit_a = a.first().map_or(0, |&c| digit(c));
    let digit_b = b
        .and_then(|b| b.first())
        .map_or(DIGITS.len(), |&c| digit(c));

    if digit_b.saturating_sub(digit_a) > 1 {
        vec![DIGITS[(digit_a + digit_b + 1) / 2]]
    } else if let Some(b) = b.filter(|b| b.len() > 1) {
        vec![b[0]]
    } else {
        let mut out = vec![DIGITS[digit_a]];
        out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
        out
    }
}

fn increment_integer(int: &str) -> KeyResult<Option<String>> {
    let bytes = int.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();

    let mut carry = true;
    for slot in digits.iter_mut().rev() {
        let next = digit(*slot) + 1;
        if next == DIGITS.len() {
            *slot = ZERO;
        } else {
            *slot = DIGITS[next];
            carry = false;
            break;
        }
    }

    if !carry {
        return Ok(Some(join(&(head as char).to_string(), &digits)));
    }
    match head {
        b'Z' => Ok(Some(INITIAL_KEY.to_string())),
        b'z' => Ok(None),
        _ => {
            let next_head = head + 1;
            if next_head > b'a' {
                digits.push(ZERO);
            } else {
                digits.pop();
            }
            Ok(Some(join(&(next_head as char).to_string(), &digits)))
        }
    }
}

fn decrement_integer(int: &str) -> KeyResult<Option<String>> {
    let bytes = int.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();

    let mut borrow = true;
    for slot in digits.iter_mut().rev() {
        let current = digit(*slot);
        if current == 0 {
            *slot = LAST_DIGIT;
        } else {
            *slot = DIGITS[current - 1];
            borrow = false;
            break;
        }
    }

    if !borrow {
        return Ok(Some(join(&(head as char).to_string(), &digits)));
    }
    match head {
        b'a' => Ok(Some("Zz".to_string())),
        b'A' => Ok(None),
        _ => {
            let next_head = head - 1;
            if next_head < b'Z' {
                digits.push(LAST_DIGIT);
            } else {
                digits.pop();
            }
            Ok(Some(join(&(next_head as char).to_string(), &digits)))
        }
    }
}

//! Null-terminated string pointer arrays, for the `argv` and `envp` of `execve()`.

use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;

use crate::error::Result;


#[derive(Clone)]
enum Entry<'a> {
    // Borrowed from memory we don't own, such as the environment block of
    // another array.
    Foreign(&'a CStr),

    // Copied in by an append, and kept alive by the array.
    Owned(CString),
}

impl Entry<'_> {
    fn as_c_str(&self) -> &CStr {
        match self {
            Entry::Foreign(s) => s,
            Entry::Owned(s) => s.as_c_str(),
        }
    }
}

/// An array of C string pointers which always ends with exactly one null
/// sentinel, suitable for passing as `argv` or `envp` to the `exec` family.
///
/// Strings passed to [`append()`](NullTermArray::append) are copied and owned
/// by the array. Strings of a foreign array passed to
/// [`from_raw()`](NullTermArray::from_raw) are borrowed for `'a`.
///
/// Appends are transactional: either every value is added, or the array is
/// left exactly as it was.
pub struct NullTermArray<'a> {
    entries: Vec<Entry<'a>>,

    // Pointer view over `entries`, re-derived after every mutation. The last
    // element is always null, and no other element is.
    pointers: Vec<*const libc::c_char>,
}

impl<'a> NullTermArray<'a> {
    pub fn new() -> Self {
        let entries = vec![];
        let pointers = vec![ptr::null()];

        Self { entries, pointers }
    }

    /// Copy the pointers of a null-terminated array, without copying the
    /// strings they point to.
    ///
    /// A null `array` is treated as empty.
    ///
    /// # Safety
    ///
    /// `array` must be null or point to a null-terminated array of pointers to
    /// NUL-terminated strings, and those strings must stay alive and unmodified
    /// for `'a`.
    pub unsafe fn from_raw(array: *const *const libc::c_char) -> Self {
        let mut strings = vec![];

        if !array.is_null() {
            let mut i = 0;

            loop {
                let p = *array.add(i);

                if p.is_null() {
                    break;
                }

                strings.push(CStr::from_ptr(p));
                i += 1;
            }
        }

        Self::from_cstrs(strings)
    }

    /// Build an array which borrows each of `strings`, in order.
    pub fn from_cstrs(strings: impl IntoIterator<Item = &'a CStr>) -> Self {
        let entries = strings.into_iter().map(Entry::Foreign).collect();
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<Entry<'a>>) -> Self {
        let mut array = Self { entries, pointers: vec![] };
        array.rederive_pointers();
        array
    }

    /// Copy `value` into the array, just before the null sentinel.
    pub fn append(&mut self, value: impl Into<Vec<u8>>) -> Result<()> {
        self.append_all(std::iter::once(value))
    }

    /// Copy each of `values` into the array, in order, just before the null
    /// sentinel.
    ///
    /// If any value can't be stored, no value is appended.
    pub fn append_all<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let sentinel = self.sentinel_index()?;

        // Stage everything which can fail before touching `self`.
        let staged: std::result::Result<Vec<_>, _> = values
            .into_iter()
            .map(CString::new)
            .collect();
        let staged = staged?;

        self.try_reserve(staged.len())?;

        // Commit. Capacity is reserved, so nothing below can fail.
        //
        // A `CString` owns a heap buffer, so its pointer survives the move into
        // `entries`.
        self.pointers.truncate(sentinel);

        for value in staged {
            self.pointers.push(value.as_ptr());
            self.entries.push(Entry::Owned(value));
        }

        self.pointers.push(ptr::null());

        Ok(())
    }

    /// Remove every entry for which `predicate` returns `true`. The null
    /// sentinel is never passed to `predicate`, and never removed.
    pub fn remove_matching<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&CStr) -> bool,
    {
        self.entries.retain(|e| !predicate(e.as_c_str()));
        self.rederive_pointers();
    }

    /// The pointer array, including the trailing null sentinel.
    ///
    /// The borrow keeps the array from being mutated or dropped while the view
    /// is held. Raw pointers taken from the view are invalidated by the next
    /// mutation.
    pub fn underlying_array(&self) -> &[*const libc::c_char] {
        &self.pointers
    }

    /// Raw pointer to the first element of [`underlying_array()`](Self::underlying_array).
    pub fn as_ptr(&self) -> *const *const libc::c_char {
        self.pointers.as_ptr()
    }

    /// Number of pointers, including the null sentinel.
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// `true` if the sentinel is the only element.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> + '_ {
        self.entries.iter().map(Entry::as_c_str)
    }

    /// Lossy copy of every entry, in order, without the sentinel.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    // Only grows capacity, so a failure leaves the contents untouched.
    fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.entries.try_reserve(additional)?;
        self.pointers.try_reserve(additional)?;

        Ok(())
    }

    fn sentinel_index(&self) -> Result<usize> {
        match self.pointers.last() {
            Some(p) if p.is_null() => Ok(self.pointers.len() - 1),
            _ => internal_error!("null-terminated array lost its sentinel"),
        }
    }

    fn rederive_pointers(&mut self) {
        self.pointers.clear();
        self.pointers.extend(self.entries.iter().map(|e| e.as_c_str().as_ptr()));
        self.pointers.push(ptr::null());
    }
}

impl Default for NullTermArray<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// Owned strings are cloned, so the pointer view must be re-derived rather than copied.
impl Clone for NullTermArray<'_> {
    fn clone(&self) -> Self {
        Self::from_entries(self.entries.clone())
    }
}

impl PartialEq for NullTermArray<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for NullTermArray<'_> {}

impl fmt::Debug for NullTermArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Append `key=value` to an environment array.
pub fn insert_environment_pair(array: &mut NullTermArray<'_>, key: &str, value: &str) -> Result<()> {
    array.append(format!("{}={}", key, value))
}

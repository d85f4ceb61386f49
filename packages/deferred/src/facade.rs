//! The resolved view of a deferred instance.

use std::any::type_name;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::MemberError;

/// Member names that are never visible through a [`Resolved`] instance.
///
/// These are the awaiting protocol of [`Deferred`][crate::Deferred] (its `Future` surface and its
/// callback-style verbs) plus the names of the internal handles through which it reaches its
/// state machine and its resolved view. A domain type that reports a member with one of these names
/// via [`Members`] will still have it hidden when accessed through [`Resolved`].
pub const HIDDEN_MEMBERS: &[&str] = &[
    "poll",
    "into_future",
    "wait",
    "wait_or_else",
    "on_failure",
    "on_completion",
    "core",
    "state",
    "facade",
];

/// Runtime access to the named members of a domain type.
///
/// Implementing this is optional. It allows generic code to inspect and modify a resolved
/// instance by member name, via [`Resolved::read()`], [`Resolved::exists()`],
/// [`Resolved::enumerate()`] and [`Resolved::write()`].
///
/// Reads must return the current value, so members that can change after initialization
/// are expected to live in `Cell` or `RefCell` fields.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
///
/// use deferred::{MemberError, Members};
///
/// struct Counter {
///     count: Cell<u32>,
/// }
///
/// impl Members for Counter {
///     type Value = u32;
///
///     fn member_names(&self) -> Vec<&'static str> {
///         vec!["count"]
///     }
///
///     fn read_member(&self, name: &str) -> Option<u32> {
///         (name == "count").then(|| self.count.get())
///     }
///
///     fn write_member(&self, name: &str, value: u32) -> Result<(), MemberError> {
///         match name {
///             "count" => {
///                 self.count.set(value);
///                 Ok(())
///             }
///             _ => Err(MemberError::unknown(name)),
///         }
///     }
/// }
/// ```
pub trait Members {
    /// The dynamic representation of member values.
    ///
    /// If a member can be legitimately unset, represent that inside this type (e.g. with a
    /// dedicated variant) so it stays distinguishable from an absent member.
    type Value;

    /// Names of the members of this instance, in a stable order.
    fn member_names(&self) -> Vec<&'static str>;

    /// Reads the current value of a member, or `None` if there is no such member.
    fn read_member(&self, name: &str) -> Option<Self::Value>;

    /// Writes a new value to a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not exist, is read-only or cannot hold the value.
    fn write_member(&self, name: &str, value: Self::Value) -> Result<(), MemberError>;

    /// Whether this instance has a member with the given name.
    fn has_member(&self, name: &str) -> bool {
        self.member_names().contains(&name)
    }
}

/// A successfully initialized instance of `T`.
///
/// This is what awaiting a [`Deferred<T>`][crate::Deferred] produces. It dereferences to `T`,
/// so every field and method of the domain type is directly usable, while none of the awaiting
/// protocol of the deferred handle is reachable from here.
///
/// Every observer of the same deferred instance receives a handle to the same allocation (see
/// [`Resolved::ptr_eq()`]), and that allocation is the one the initializer worked on. Changes
/// made through interior mutability are visible through every handle.
pub struct Resolved<T> {
    target: Rc<T>,
}

impl<T> Resolved<T> {
    pub(crate) fn new(target: T) -> Self {
        Self {
            target: Rc::new(target),
        }
    }

    /// The shared allocation, as handed to the initializer.
    pub(crate) fn target(&self) -> Rc<T> {
        Rc::clone(&self.target)
    }

    /// Whether two resolved handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.target, &other.target)
    }

    /// Whether `name` is hidden on every resolved instance.
    #[must_use]
    pub fn is_hidden(name: &str) -> bool {
        HIDDEN_MEMBERS.contains(&name)
    }
}

impl<T: Members> Resolved<T> {
    /// Reads the current value of a member.
    ///
    /// Returns `None` for hidden members and for members the instance does not have.
    ///
    /// This is an associated function so it never shadows a method of `T` with the same name.
    #[must_use]
    pub fn read(this: &Self, name: &str) -> Option<T::Value> {
        if Self::is_hidden(name) {
            return None;
        }

        this.target.read_member(name)
    }

    /// Whether the instance has a visible member with the given name.
    #[must_use]
    pub fn exists(this: &Self, name: &str) -> bool {
        !Self::is_hidden(name) && this.target.has_member(name)
    }

    /// Names of all visible members, in the order reported by the instance.
    #[must_use]
    pub fn enumerate(this: &Self) -> Vec<&'static str> {
        this.target
            .member_names()
            .into_iter()
            .filter(|name| !Self::is_hidden(name))
            .collect()
    }

    /// Writes a new value to a member of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`MemberError::Hidden`] for hidden members, leaving the instance untouched.
    /// Otherwise returns whatever error the instance reports for the write.
    pub fn write(this: &Self, name: &str, value: T::Value) -> Result<(), MemberError> {
        if Self::is_hidden(name) {
            return Err(MemberError::hidden(name));
        }

        this.target.write_member(name, value)
    }
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            target: Rc::clone(&self.target),
        }
    }
}

impl<T> Deref for Resolved<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.target
    }
}

impl<T> AsRef<T> for Resolved<T> {
    fn as_ref(&self) -> &T {
        &self.target
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl<T: fmt::Debug> fmt::Debug for Resolved<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("target", &*self.target)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::RefCell;

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Resolved<u32>: Send, Sync);

    #[derive(Clone, Debug, PartialEq)]
    enum Value {
        Unset,
        Text(String),
    }

    // Deliberately reports members that collide with the hidden set.
    struct Record {
        label: RefCell<Option<String>>,
        wait: RefCell<String>,
        state: RefCell<String>,
    }

    impl Record {
        fn new() -> Self {
            Self {
                label: RefCell::new(None),
                wait: RefCell::new("shadowed".to_string()),
                state: RefCell::new("shadowed".to_string()),
            }
        }
    }

    impl Members for Record {
        type Value = Value;

        fn member_names(&self) -> Vec<&'static str> {
            vec!["label", "wait", "state", "kind"]
        }

        fn read_member(&self, name: &str) -> Option<Value> {
            match name {
                "label" => Some(
                    self.label
                        .borrow()
                        .clone()
                        .map_or(Value::Unset, Value::Text),
                ),
                "wait" => Some(Value::Text(self.wait.borrow().clone())),
                "state" => Some(Value::Text(self.state.borrow().clone())),
                "kind" => Some(Value::Text("record".to_string())),
                _ => None,
            }
        }

        fn write_member(&self, name: &str, value: Value) -> Result<(), MemberError> {
            let cell = match name {
                "label" => {
                    *self.label.borrow_mut() = match value {
                        Value::Unset => None,
                        Value::Text(text) => Some(text),
                    };
                    return Ok(());
                }
                "wait" => &self.wait,
                "state" => &self.state,
                "kind" => return Err(MemberError::read_only(name)),
                _ => return Err(MemberError::unknown(name)),
            };

            match value {
                Value::Text(text) => {
                    *cell.borrow_mut() = text;
                    Ok(())
                }
                Value::Unset => Err(MemberError::TypeMismatch {
                    name: name.to_string(),
                    expected: "text".to_string(),
                }),
            }
        }
    }

    #[test]
    fn unset_value_is_distinct_from_absent() {
        let resolved = Resolved::new(Record::new());

        assert_eq!(Resolved::read(&resolved, "label"), Some(Value::Unset));
        assert_eq!(Resolved::read(&resolved, "missing"), None);
        assert_eq!(Resolved::read(&resolved, "wait"), None);
    }

    #[test]
    fn reads_are_live() {
        let resolved = Resolved::new(Record::new());
        let other = resolved.clone();

        *resolved.label.borrow_mut() = Some("first".to_string());
        assert_eq!(
            Resolved::read(&other, "label"),
            Some(Value::Text("first".to_string()))
        );

        Resolved::write(&other, "label", Value::Text("second".to_string())).unwrap();
        assert_eq!(
            Resolved::read(&resolved, "label"),
            Some(Value::Text("second".to_string()))
        );
    }

    #[test]
    fn hidden_members_do_not_exist() {
        let resolved = Resolved::new(Record::new());

        for name in HIDDEN_MEMBERS {
            assert!(!Resolved::exists(&resolved, name), "{name} should be hidden");
        }

        assert!(Resolved::exists(&resolved, "label"));
        assert!(Resolved::exists(&resolved, "kind"));
        assert!(!Resolved::exists(&resolved, "missing"));
    }

    #[test]
    fn enumerate_skips_hidden_members() {
        let resolved = Resolved::new(Record::new());

        assert_eq!(Resolved::enumerate(&resolved), vec!["label", "kind"]);
    }

    #[test]
    fn writing_hidden_member_is_rejected_without_side_effects() {
        let resolved = Resolved::new(Record::new());

        let result = Resolved::write(
            &resolved,
            "state",
            Value::Text("corrupted".to_string()),
        );

        assert_eq!(result, Err(MemberError::hidden("state")));
        assert_eq!(*resolved.state.borrow(), "shadowed");
    }

    #[test]
    fn write_errors_come_from_the_instance() {
        let resolved = Resolved::new(Record::new());

        assert_eq!(
            Resolved::write(&resolved, "kind", Value::Unset),
            Err(MemberError::read_only("kind"))
        );
        assert_eq!(
            Resolved::write(&resolved, "missing", Value::Unset),
            Err(MemberError::unknown("missing"))
        );
    }

    #[test]
    fn clones_share_the_instance() {
        let resolved = Resolved::new(Record::new());
        let clone = resolved.clone();
        let unrelated = Resolved::new(Record::new());

        assert!(Resolved::ptr_eq(&resolved, &clone));
        assert!(!Resolved::ptr_eq(&resolved, &unrelated));
    }

    #[test]
    fn is_hidden_matches_the_fixed_set() {
        assert!(Resolved::<Record>::is_hidden("wait"));
        assert!(Resolved::<Record>::is_hidden("on_completion"));
        assert!(Resolved::<Record>::is_hidden("core"));
        assert!(Resolved::<Record>::is_hidden("state"));
        assert!(Resolved::<Record>::is_hidden("facade"));
        assert!(!Resolved::<Record>::is_hidden("label"));
    }

    // A domain type whose own API uses the same method names as the reflective accessors.
    struct Settings {
        timeout: RefCell<String>,
    }

    impl Settings {
        fn read(&self, key: &str) -> Option<String> {
            (key == "wait" || key == "timeout").then(|| self.timeout.borrow().clone())
        }

        fn write(&self, value: &str) {
            *self.timeout.borrow_mut() = value.to_string();
        }

        fn exists(&self) -> bool {
            !self.timeout.borrow().is_empty()
        }

        fn enumerate(&self) -> usize {
            usize::from(self.exists())
        }
    }

    impl Members for Settings {
        type Value = String;

        fn member_names(&self) -> Vec<&'static str> {
            vec!["timeout"]
        }

        fn read_member(&self, name: &str) -> Option<String> {
            (name == "timeout").then(|| self.timeout.borrow().clone())
        }

        fn write_member(&self, name: &str, value: String) -> Result<(), MemberError> {
            match name {
                "timeout" => {
                    *self.timeout.borrow_mut() = value;
                    Ok(())
                }
                _ => Err(MemberError::unknown(name)),
            }
        }
    }

    #[test]
    fn domain_methods_are_not_shadowed_by_reflection() {
        let resolved = Resolved::new(Settings {
            timeout: RefCell::new("30s".to_string()),
        });

        // Method calls reach the domain type.
        assert_eq!(resolved.read("wait").as_deref(), Some("30s"));
        assert!(resolved.exists());
        assert_eq!(resolved.enumerate(), 1);

        resolved.write("45s");
        assert_eq!(resolved.read("timeout").as_deref(), Some("45s"));

        // Reflection stays available through associated functions.
        assert_eq!(Resolved::read(&resolved, "wait"), None);
        assert_eq!(
            Resolved::read(&resolved, "timeout").as_deref(),
            Some("45s")
        );
        assert!(Resolved::exists(&resolved, "timeout"));
        assert_eq!(Resolved::enumerate(&resolved), vec!["timeout"]);

        Resolved::write(&resolved, "timeout", "1m".to_string()).unwrap();
        assert_eq!(resolved.read("timeout").as_deref(), Some("1m"));
    }
}

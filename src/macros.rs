/// Shorthand for [`Name::new`](crate::Name::new), for call sites that construct many names inline.
#[macro_export]
macro_rules! name {
    ($name:expr) => {
        $crate::Name::new($name)
    };
}

//! Declaring the concrete maps a program uses.

/// Declares named map types, one per manifest line.
///
/// Each line names a key type and a value type and expands to a type alias
/// over [`RobinMap`](crate::RobinMap), or over [`StableMap`](crate::StableMap)
/// when the line starts with `stable`. A line may end with `hasher = H` to
/// pick a [`KeyHasher`](crate::KeyHasher) other than the default one.
/// Attributes and doc comments on a line are carried over to the alias.
///
/// The aliases are ordinary generic instantiations, so every declared pair
/// gets its own monomorphized code with no runtime dispatch.
///
/// # Examples
///
/// ```rust
/// use robin_hash::define_maps;
/// use robin_hash::hasher::Fnv1aBuildHasher;
/// use robin_hash::hasher::StdKeyHasher;
///
/// pub struct Record {
///     pub score: u32,
/// }
///
/// define_maps! {
///     /// Counts keyed by id.
///     pub IntMap: i32 => i32;
///     pub stable Registry: u64 => Record;
///     Names: String => u32, hasher = StdKeyHasher<Fnv1aBuildHasher>;
/// }
///
/// let mut counts = IntMap::new();
/// counts.insert(1, 10);
///
/// let mut registry = Registry::new();
/// let ptr = registry.insert_and_get_ptr(7, Record { score: 3 });
/// assert_eq!(registry.get_ptr(&7), Some(ptr));
///
/// let mut names = Names::default();
/// names.insert("ada".to_string(), 1);
/// assert_eq!(names.get(&"ada".to_string()), Some(&1));
/// ```
#[macro_export]
macro_rules! define_maps {
    () => {};

    (
        $(#[$meta:meta])*
        $vis:vis stable $name:ident : $key:ty => $value:ty, hasher = $hasher:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis type $name = $crate::StableMap<$key, $value, $hasher>;
        $crate::define_maps! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis stable $name:ident : $key:ty => $value:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis type $name = $crate::StableMap<$key, $value>;
        $crate::define_maps! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $key:ty => $value:ty, hasher = $hasher:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis type $name = $crate::RobinMap<$key, $value, $hasher>;
        $crate::define_maps! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident : $key:ty => $value:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis type $name = $crate::RobinMap<$key, $value>;
        $crate::define_maps! { $($rest)* }
    };
}

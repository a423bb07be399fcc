//! Tuple-shape utilities
//!
//! Parameter lists of decorated operations are plain Rust tuples. These
//! traits grow or split them at the type level while keeping every element's
//! type and relative order:
//!
//! - [`Prepend`]: `(B, C)` + `A` becomes `(A, B, C)`
//! - [`Append`]: `(A, B)` + `C` becomes `(A, B, C)`
//! - [`Pop`]: `(A, B, C)` becomes `((A, B), C)`, the inverse of [`Append`]
//!
//! Elements keep their declared types exactly. An element declared
//! `Option<T>` stays `Option<T>`, and a required element never gains an
//! "absent" variant by being appended to.
//!
//! Implemented for tuples of up to 12 elements (13 for the outputs).

/// A fixed-arity ordered parameter list
pub trait Tuple {
    /// Number of elements
    const ARITY: usize;
}

/// Prepend `V` in front of every element of `Self`
pub trait Prepend<V>: Tuple {
    /// `(V, Self.0, Self.1, ...)`
    type Output: Tuple;

    /// Build the prepended tuple
    fn prepend(self, value: V) -> Self::Output;
}

/// Append `V` after every element of `Self`
pub trait Append<V>: Tuple {
    /// `(Self.0, Self.1, ..., V)`
    type Output: Tuple;

    /// Build the appended tuple
    fn append(self, value: V) -> Self::Output;
}

/// Split a non-empty tuple into its leading elements and its last element
pub trait Pop: Tuple {
    /// Every element except the last
    type Init: Tuple;

    /// The last element
    type Last;

    /// Split the tuple
    fn pop(self) -> (Self::Init, Self::Last);
}

/// Shorthand for `<T as Prepend<V>>::Output`
pub type Prepended<V, T> = <T as Prepend<V>>::Output;

/// Shorthand for `<T as Append<V>>::Output`
pub type Appended<T, V> = <T as Append<V>>::Output;

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! tuple_impls {
    ($( ($($name:ident),*) )+) => {
        $(
            impl<$($name,)*> Tuple for ($($name,)*) {
                const ARITY: usize = count!($($name)*);
            }
        )+
    };
}

macro_rules! grow_impls {
    ($( ($($name:ident),*) )+) => {
        $(
            impl<V, $($name,)*> Prepend<V> for ($($name,)*) {
                type Output = (V, $($name,)*);

                #[allow(non_snake_case, clippy::unused_unit)]
                fn prepend(self, value: V) -> Self::Output {
                    let ($($name,)*) = self;
                    (value, $($name,)*)
                }
            }

            impl<V, $($name,)*> Append<V> for ($($name,)*) {
                type Output = ($($name,)* V,);

                #[allow(non_snake_case, clippy::unused_unit)]
                fn append(self, value: V) -> Self::Output {
                    let ($($name,)*) = self;
                    ($($name,)* value,)
                }
            }
        )+
    };
}

macro_rules! pop_impls {
    ($( ($($init:ident),* ; $last:ident) )+) => {
        $(
            impl<$($init,)* $last> Pop for ($($init,)* $last,) {
                type Init = ($($init,)*);
                type Last = $last;

                #[allow(non_snake_case, clippy::unused_unit)]
                fn pop(self) -> (Self::Init, Self::Last) {
                    let ($($init,)* $last,) = self;
                    (($($init,)*), $last)
                }
            }
        )+
    };
}

tuple_impls! {
    ()
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
    (A, B, C, D, E, F, G, H)
    (A, B, C, D, E, F, G, H, I)
    (A, B, C, D, E, F, G, H, I, J)
    (A, B, C, D, E, F, G, H, I, J, K)
    (A, B, C, D, E, F, G, H, I, J, K, L)
    (A, B, C, D, E, F, G, H, I, J, K, L, M)
}

grow_impls! {
    ()
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
    (A, B, C, D, E, F, G, H)
    (A, B, C, D, E, F, G, H, I)
    (A, B, C, D, E, F, G, H, I, J)
    (A, B, C, D, E, F, G, H, I, J, K)
    (A, B, C, D, E, F, G, H, I, J, K, L)
}

pop_impls! {
    (; A)
    (A; B)
    (A, B; C)
    (A, B, C; D)
    (A, B, C, D; E)
    (A, B, C, D, E; F)
    (A, B, C, D, E, F; G)
    (A, B, C, D, E, F, G; H)
    (A, B, C, D, E, F, G, H; I)
    (A, B, C, D, E, F, G, H, I; J)
    (A, B, C, D, E, F, G, H, I, J; K)
    (A, B, C, D, E, F, G, H, I, J, K; L)
    (A, B, C, D, E, F, G, H, I, J, K, L; M)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    fn same_type<X: 'static, Y: 'static>() -> bool {
        TypeId::of::<X>() == TypeId::of::<Y>()
    }

    #[test]
    fn prepend_shifts_every_element() {
        assert_eq!(<Prepended<u8, ()> as Tuple>::ARITY, 1);
        assert!(same_type::<Prepended<u8, ()>, (u8,)>());
        assert!(same_type::<Prepended<u8, (String, bool)>, (u8, String, bool)>());

        let grown = ("key".to_string(), true).prepend(7u64);
        assert_eq!(grown, (7u64, "key".to_string(), true));
        assert_eq!(<(u64, String, bool) as Tuple>::ARITY, 3);
    }

    #[test]
    fn append_keeps_leading_elements() {
        assert!(same_type::<Appended<(), u8>, (u8,)>());
        assert!(same_type::<Appended<(u8, String), bool>, (u8, String, bool)>());

        let grown = (1u8, "a").append('z');
        assert_eq!(grown, (1u8, "a", 'z'));
    }

    #[test]
    fn append_preserves_declared_optionality() {
        // Required elements stay required and optional ones stay optional.
        assert!(same_type::<
            Appended<(u32, Option<u32>, Option<String>), bool>,
            (u32, Option<u32>, Option<String>, bool),
        >());
    }

    #[test]
    fn pop_inverts_append() {
        let params = (1u8, 2u16).append(3u32);
        let (init, last) = params.pop();
        assert_eq!(init, (1u8, 2u16));
        assert_eq!(last, 3u32);

        let ((), only) = ("solo",).pop();
        assert_eq!(only, "solo");
    }

    #[test]
    fn largest_supported_arity() {
        type Twelve = (u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8);
        assert_eq!(<Twelve as Tuple>::ARITY, 12);
        assert_eq!(<Appended<Twelve, u16> as Tuple>::ARITY, 13);
        assert_eq!(<Prepended<u16, Twelve> as Tuple>::ARITY, 13);
    }
}

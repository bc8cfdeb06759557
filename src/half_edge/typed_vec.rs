/// Defines an index newtype together with a `Vec` wrapper that can only be indexed by it.
///
/// Used for arenas whose ids must not be confused with node, edge or hedge indices
/// (faces of an embedding, nodes of a PQ-tree).
#[macro_export]
macro_rules! define_indexed_vec {
    (
        $(#[$idx_meta:meta])*
        $idx_vis:vis struct $Idx:ident ;

        $(#[$vec_meta:meta])*
        $vec_vis:vis struct $Vec:ident ;
    ) => {
        $(#[$idx_meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $idx_vis struct $Idx(pub usize);

        impl ::std::convert::From<usize> for $Idx {
            fn from(value: usize) -> Self {
                $Idx(value)
            }
        }

        impl ::std::convert::From<$Idx> for usize {
            fn from(value: $Idx) -> Self {
                value.0
            }
        }

        impl ::std::fmt::Display for $Idx {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        $(#[$vec_meta])*
        #[derive(Clone, Debug, Hash, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vec_vis struct $Vec<T>(::std::vec::Vec<T>);

        impl<T> ::std::default::Default for $Vec<T> {
            fn default() -> Self {
                Self(::std::vec::Vec::new())
            }
        }

        impl<T> ::std::ops::Index<$Idx> for $Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, i: $Idx) -> &Self::Output {
                &self.0[i.0]
            }
        }

        impl<T> ::std::ops::IndexMut<$Idx> for $Vec<T> {
            #[inline]
            fn index_mut(&mut self, i: $Idx) -> &mut Self::Output {
                &mut self.0[i.0]
            }
        }

        impl<T> $Vec<T> {
            #[inline]
            pub fn new() -> Self {
                Self(::std::vec::Vec::new())
            }

            #[inline]
            pub fn with_capacity(c: usize) -> Self {
                Self(::std::vec::Vec::with_capacity(c))
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Appends `value` and returns its index.
            #[inline]
            pub fn push(&mut self, value: T) -> $Idx {
                let idx = $Idx(self.0.len());
                self.0.push(value);
                idx
            }

            #[inline]
            pub fn get(&self, idx: $Idx) -> Option<&T> {
                self.0.get(idx.0)
            }

            #[inline]
            pub fn get_mut(&mut self, idx: $Idx) -> Option<&mut T> {
                self.0.get_mut(idx.0)
            }

            #[inline]
            pub fn clear(&mut self) {
                self.0.clear()
            }

            pub fn iter(&self) -> impl ::std::iter::Iterator<Item = ($Idx, &T)> + '_ {
                self.0.iter().enumerate().map(|(u, t)| ($Idx(u), t))
            }

            pub fn iter_mut(&mut self) -> impl ::std::iter::Iterator<Item = ($Idx, &mut T)> + '_ {
                self.0.iter_mut().enumerate().map(|(u, t)| ($Idx(u), t))
            }

            pub fn keys(&self) -> impl ::std::iter::Iterator<Item = $Idx> {
                (0..self.0.len()).map($Idx)
            }

            #[inline]
            pub fn raw(&self) -> &::std::vec::Vec<T> {
                &self.0
            }
        }

        impl<T> ::std::iter::FromIterator<T> for $Vec<T> {
            fn from_iter<I: ::std::iter::IntoIterator<Item = T>>(it: I) -> Self {
                Self(::std::vec::Vec::from_iter(it))
            }
        }

        impl<T> ::std::convert::From<::std::vec::Vec<T>> for $Vec<T> {
            fn from(v: ::std::vec::Vec<T>) -> Self {
                Self(v)
            }
        }
    };
}

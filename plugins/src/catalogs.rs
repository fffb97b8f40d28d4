//! [`Catalog`](corral_common::catalog::Catalog) backends.

mod static_list;

pub use static_list::StaticCatalog;

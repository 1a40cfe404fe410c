//! Cookie handling.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`jar`] | The [`CookieJar`] capability and `Cookie`/`Set-Cookie` header helpers |
//! | [`store`] | [`CookieStore`], the default in-memory jar (RFC 6265 matching, PSL checks) |
//! | [`sync`] | Reconciling manually set `cookie` headers across redirects |

pub mod jar;
pub mod store;
pub mod sync;

pub use jar::CookieJar;
pub use store::CookieStore;

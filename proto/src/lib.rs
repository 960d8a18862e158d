//! Types that cross the boundary of the Boreal server core - result codes,
//! control object identifiers, writability modes and error enums. Everything
//! here is stable, serialisable, and shared between the server core and any
//! front end that speaks for it.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod constants;
pub mod internal;

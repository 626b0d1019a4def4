//! Intake schema layer
//!
//! This is where submissions enter the intake pipeline. We take a raw request
//! body, work out which of the accepted shapes it is, validate it, and hand
//! back one canonical record that the guard, store and dispatch stages can
//! rely on.
//!
//! ## What we do here
//!
//! - **Dual-shape applications** - [`parse_application`] tries the legacy
//!   field names first and the current ones second; both land in
//!   [`ApplicationFields`] and then [`Lead`].
//! - **Loose contact bodies** - [`FormFields`] wraps JSON, urlencoded and
//!   multipart bodies; [`parse_contact`] turns them into a
//!   [`ContactSubmission`] with an [`Attribution`] record.
//! - **Coercion** - [`coerce_list`] maps single strings, arrays and
//!   comma-separated strings to the same ordered list.
//! - **Normalization** - emails are trimmed and lowercased before anything
//!   is validated, stored or published.
//!
//! ## Example
//!
//! ```
//! use schema::{parse_application, Lead, Receipt};
//!
//! let body = br#"{
//!     "name": "Taro",
//!     "email": "Taro@Example.com",
//!     "detail": "Please contact me about pricing",
//!     "turnstileToken": "validtoken123"
//! }"#;
//!
//! let fields = parse_application(body).unwrap();
//! let lead = Lead::new(fields, &Receipt::new("203.0.113.7", "curl/8"));
//! assert_eq!(lead.email, "taro@example.com");
//! assert_eq!(lead.status.as_str(), "received");
//! ```

mod application;
mod coerce;
mod contact;
mod error;
mod fields;
mod lead;

pub use crate::application::{
    normalize_email, parse_application, ApplicationFields, ApplicationShape,
};
pub use crate::coerce::{coerce_list, coerce_text};
pub use crate::contact::{parse_contact, Attribution, ContactSubmission};
pub use crate::error::SchemaError;
pub use crate::fields::FormFields;
pub use crate::lead::{Lead, LeadStatus, Receipt};

/// Minimum length, in characters, of a message/detail body.
pub const MIN_DETAIL_CHARS: usize = 10;

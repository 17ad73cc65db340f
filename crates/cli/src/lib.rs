//! BookProbe CLI
//!
//! Command-line surface for the booking-form suite, the payment-link
//! probe and the page exploration scripts.

pub mod commands;
pub mod output;

//! # moviliax-site
//!
//! Build-time and form-handling tooling for the MOVILIAX marketing website.
//! The site itself is static HTML; this crate covers the two pieces with a
//! contract worth testing outside a browser.
//!
//! # Sitemap Generator
//!
//! A single sequential batch run:
//!
//! ```text
//! site root  →  discover  →  generate  →  sitemap.xml + report
//! ```
//!
//! The generator is a function of a file-system snapshot and an explicit
//! [`config::SiteConfig`]. The production configuration is compiled in, so
//! running the binary with no arguments from the site root is enough. Runs
//! are deterministic: an unchanged tree produces a byte-identical sitemap.
//!
//! # Newsletter Flow
//!
//! [`newsletter::NewsletterForm`] validates an address, applies a rate limit
//! and a honeypot check, then makes exactly one POST to the subscription
//! endpoint. The UI is reached only through the [`newsletter::FormView`]
//! trait, and the network only through [`newsletter::Transport`], so the
//! whole flow runs under test with in-memory doubles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Compiled-in defaults, `sitemap.toml` overlay, validation |
//! | [`sitemap`] | Discovery, ordering, URL mapping, XML serialization |
//! | [`newsletter`] | Subscription controller, HTTP transport, view and clock seams |
//! | [`logger`] | Injectable environment-gated logger and `tracing` setup |
//! | [`output`] | CLI report formatting and the terminal form view |
//!
//! # Design Decisions
//!
//! ## Configuration Is a Value
//!
//! Exclusion lists and the priority table live in a `SiteConfig` passed to
//! [`sitemap::run`], never in statics. Tests build their own config; the
//! binary starts from [`Default`] and merges an optional `sitemap.toml`.
//!
//! ## Loose Rate Limit, Kept on Purpose
//!
//! The form counts successful submissions for its whole lifetime and only
//! checks how long ago the *last* one happened. Three quick successes
//! followed by a fourth after a minute are accepted. This is the deployed
//! behavior and is preserved as such.

pub mod config;
pub mod logger;
pub mod newsletter;
pub mod output;
pub mod sitemap;

#[cfg(test)]
pub(crate) mod test_helpers;

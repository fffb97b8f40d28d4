//! # Target Model
//!
//! Defines the reservable resources a job can acquire.
//!
//! A catalog hands out [`RawRecord`]s, four plain text columns where an empty
//! string means "absent". Each record is validated into a [`Target`]:
//! * The **id** is mandatory and is the key the locker works with.
//! * The **display name** is an optional FQDN-like label, never validated.
//! * The **primary IPv4/IPv6** columns are optional, but a non-empty column must
//!   parse as an address of its own family.
//!
//! A record with every column empty carries no data and is skipped rather than
//! rejected.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{AddressFamily, CatalogError};

/// A device or resource that can be exclusively reserved by one job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub id: String,
    pub display_name: Option<String>,
    pub primary_ipv4: Option<Ipv4Addr>,
    pub primary_ipv6: Option<Ipv6Addr>,
}

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            primary_ipv4: None,
            primary_ipv6: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_ipv4(mut self, addr: Ipv4Addr) -> Self {
        self.primary_ipv4 = Some(addr);
        self
    }

    pub fn with_ipv6(mut self, addr: Ipv6Addr) -> Self {
        self.primary_ipv6 = Some(addr);
        self
    }

    /// Returns the first dot-delimited label of the display name.
    ///
    /// `web01.example.com` yields `web01`. Targets without a name yield `None`.
    pub fn first_label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(|name| name.split('.').next())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({name})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One unvalidated row as produced by a catalog backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub name: String,
    pub ipv4: String,
    pub ipv6: String,
}

impl RawRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ipv4: impl Into<String>,
        ipv6: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ipv4: ipv4.into(),
            ipv6: ipv6.into(),
        }
    }

    /// A record with no data in any column.
    pub fn is_blank(&self) -> bool {
        self.id.is_empty() && self.name.is_empty() && self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// Validates the record into a [`Target`].
    ///
    /// `index` is the record's position in the catalog snapshot and is only
    /// used to point at the offending row in errors.
    ///
    /// Returns `Ok(None)` for a blank record.
    pub fn into_target(self, index: usize) -> Result<Option<Target>, CatalogError> {
        if self.is_blank() {
            return Ok(None);
        }

        if self.id.is_empty() {
            return Err(CatalogError::MalformedRecord {
                index,
                name: self.name,
                ipv4: self.ipv4,
                ipv6: self.ipv6,
            });
        }

        let primary_ipv4 = parse_ipv4(&self.id, &self.ipv4)?;
        let primary_ipv6 = parse_ipv6(&self.id, &self.ipv6)?;
        let display_name = Some(self.name).filter(|name| !name.is_empty());

        Ok(Some(Target {
            id: self.id,
            display_name,
            primary_ipv4,
            primary_ipv6,
        }))
    }
}

fn parse_ipv4(id: &str, raw: &str) -> Result<Option<Ipv4Addr>, CatalogError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Ipv4Addr>()
        .map(Some)
        .map_err(|_| invalid_address(id, AddressFamily::V4, raw))
}

fn parse_ipv6(id: &str, raw: &str) -> Result<Option<Ipv6Addr>, CatalogError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Ipv6Addr>()
        .map(Some)
        .map_err(|_| invalid_address(id, AddressFamily::V6, raw))
}

fn invalid_address(id: &str, family: AddressFamily, raw: &str) -> CatalogError {
    CatalogError::InvalidAddress {
        id: id.to_string(),
        family,
        value: raw.to_string(),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

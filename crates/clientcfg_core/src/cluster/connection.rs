//! Connection strings: the contents of a cluster file.

use crate::error::{HarnessError, Result};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// A parsed `description:id@host:port[,host:port...]` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    /// Human-readable cluster description.
    pub description: String,
    /// Random cluster identifier.
    pub id: String,
    /// Coordinator addresses, in file order.
    pub coordinators: Vec<SocketAddr>,
}

impl ConnectionString {
    /// Creates a connection string with freshly generated description and id.
    pub fn generate(coordinators: Vec<SocketAddr>) -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self {
            description: token[..8].to_string(),
            id: token[8..24].to_string(),
            coordinators,
        }
    }

    /// First coordinator address.
    pub fn primary_coordinator(&self) -> Option<SocketAddr> {
        self.coordinators.first().copied()
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@", self.description, self.id)?;
        for (i, addr) in self.coordinators.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", addr)?;
        }
        Ok(())
    }
}

impl FromStr for ConnectionString {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HarnessError::InvalidConnectionString(s.to_string());
        let s = s.trim();

        let (key, addrs) = s.split_once('@').ok_or_else(invalid)?;
        let (description, id) = key.split_once(':').ok_or_else(invalid)?;
        if description.is_empty() || id.is_empty() {
            return Err(invalid());
        }

        let coordinators = addrs
            .split(',')
            .filter(|a| !a.is_empty())
            .map(|a| a.parse::<SocketAddr>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        if coordinators.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            description: description.to_string(),
            id: id.to_string(),
            coordinators,
        })
    }
}

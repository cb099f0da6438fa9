//! Live connection registry.

use std::collections::BTreeMap;

use mio::Token;

use crate::connection::Connection;

/// Live connections keyed by poll token.
///
/// Tokens are allocated monotonically and never reused within a process, so
/// iteration follows accept order and a token from a torn-down connection
/// can never address a later one.
pub struct ConnectionRegistry {
    conns: BTreeMap<Token, Connection>,
    next_token: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry. Token 0 stays reserved for the listener.
    pub fn new() -> Self {
        Self {
            conns: BTreeMap::new(),
            next_token: 1,
        }
    }

    /// Allocates the next connection token.
    pub fn next_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    /// Inserts a connection under its token.
    pub fn insert(&mut self, conn: Connection) {
        self.conns.insert(conn.token, conn);
    }

    /// Removes and returns a connection.
    pub fn remove(&mut self, token: Token) -> Option<Connection> {
        self.conns.remove(&token)
    }

    /// Returns a mutable reference to a live connection.
    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection> {
        self.conns.get_mut(&token)
    }

    /// Iterates live connections in accept order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &Connection)> {
        self.conns.iter().map(|(t, c)| (*t, c))
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.conns.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Routing key derivation: `ThingsMessage` -> candidate routing keys + cache signature.

use std::fmt;

use things_core::{MethodType, StreamDirection, ThingsMessage, SEPARATOR, WILDCARD};

// ---------------------------------------------------------------------------
// RoutingKey
// ---------------------------------------------------------------------------

/// One `(identifier, product code)` slot of the routing table.
///
/// Either field may hold the [`WILDCARD`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey {
    pub identifier: String,
    pub product_code: String,
}

impl RoutingKey {
    #[must_use]
    pub fn new(identifier: impl Into<String>, product_code: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            product_code: product_code.into(),
        }
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.identifier, self.product_code)
    }
}

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Route signature under which a resolved chain is cached.
///
/// Kept as separate fields rather than a joined string so that identifiers
/// containing the separator can never collide with another signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub direction: StreamDirection,
    pub method_type: MethodType,
    pub identifier: String,
    pub product_code: String,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            self.direction, self.method_type, self.identifier, self.product_code
        )
    }
}

// ---------------------------------------------------------------------------
// ChainingKeys
// ---------------------------------------------------------------------------

/// Everything the resolver needs to know about a message's routing identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainingKeys {
    pub method_type: MethodType,
    /// Candidate slots, most specific first, without duplicates.
    pub keys: Vec<RoutingKey>,
    pub cache_key: CacheKey,
}

impl ChainingKeys {
    /// Derives the routing identity of `message` for the given direction.
    ///
    /// Produces, in order: `(id, *)`, `(id, product)`, `(*, product)`, `(*, *)`.
    /// All of them are queried; specificity only controls eligibility.
    #[must_use]
    pub fn derive(message: &ThingsMessage, direction: StreamDirection) -> Self {
        let method_type = MethodType::from_method(&message.method);
        let identifier = method_identifier(&message.method);
        let product_code = message.product_code();

        let mut keys: Vec<RoutingKey> = Vec::with_capacity(4);
        for (id, product) in [
            (identifier, WILDCARD),
            (identifier, product_code),
            (WILDCARD, product_code),
            (WILDCARD, WILDCARD),
        ] {
            let key = RoutingKey::new(id, product);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Self {
            method_type,
            keys,
            cache_key: CacheKey {
                direction,
                method_type,
                identifier: identifier.to_string(),
                product_code: product_code.to_string(),
            },
        }
    }
}

/// Strips the `<prefix>.<methodType>.` head from a method name.
///
/// Method names with fewer than three segments have nothing to strip and are
/// used whole.
#[must_use]
pub fn method_identifier(method: &str) -> &str {
    let mut parts = method.splitn(3, SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(rest)) => rest,
        _ => method,
    }
}

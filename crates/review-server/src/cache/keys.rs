//! Cache key generation and canonical encoding.

use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Placeholder for a part that could not be encoded.
const UNENCODABLE: &str = "<unencodable>";

/// Key unica para una operacion cacheada.
///
/// Combina el scope del componente, el nombre de la operacion y la
/// codificacion canonica de sus parametros. Cada parte se serializa como
/// JSON respetando el orden de declaracion de los campos, y los valores
/// ausentes se codifican como `null` en lugar de omitirse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: String,
    operation: String,
    parts: String,
    cacheable: bool,
}

impl CacheKey {
    /// Inicia un builder para `scope` y `operation`.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_server::cache::CacheKey;
    ///
    /// let key = CacheKey::builder("CustomerReview", "GetProductRating")
    ///     .part("p-1")
    ///     .build();
    /// assert_eq!(key.to_string(), r#"CustomerReview:GetProductRating:["p-1"]"#);
    /// ```
    pub fn builder(scope: impl Into<String>, operation: impl Into<String>) -> CacheKeyBuilder {
        CacheKeyBuilder {
            scope: scope.into(),
            operation: operation.into(),
            parts: Vec::new(),
            cacheable: true,
        }
    }

    /// Builder usando el nombre del tipo `T` como scope.
    pub fn builder_for<T: ?Sized>(operation: impl Into<String>) -> CacheKeyBuilder {
        Self::builder(std::any::type_name::<T>(), operation)
    }

    /// Retorna el scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Retorna el nombre de la operacion.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Retorna los parametros codificados.
    pub fn parts(&self) -> &str {
        &self.parts
    }

    /// False si alguna parte no se pudo codificar.
    /// Estas keys nunca se guardan ni se comparten entre llamadas.
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scope, self.operation, self.parts)
    }
}

/// Builder de [`CacheKey`].
#[derive(Debug)]
pub struct CacheKeyBuilder {
    scope: String,
    operation: String,
    parts: Vec<String>,
    cacheable: bool,
}

impl CacheKeyBuilder {
    /// Agrega un parametro a la key.
    ///
    /// Never fails: an unencodable value marks the key as uncacheable so the
    /// read falls through to a direct computation.
    pub fn part<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(encoded) => self.parts.push(encoded),
            Err(e) => {
                debug!(
                    scope = %self.scope,
                    operation = %self.operation,
                    error = %e,
                    "Cache key part could not be encoded, bypassing cache"
                );
                self.parts.push(UNENCODABLE.to_string());
                self.cacheable = false;
            },
        }
        self
    }

    /// Construye la key.
    pub fn build(self) -> CacheKey {
        CacheKey {
            scope: self.scope,
            operation: self.operation,
            parts: format!("[{}]", self.parts.join(",")),
            cacheable: self.cacheable,
        }
    }
}

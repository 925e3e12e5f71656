//! Read-through cache with single-flight computation, backed by Moka.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::ops::compute::Op;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::keys::CacheKey;
use super::token::ChangeToken;
use crate::metrics::CacheMetrics;

/// Error del sistema de cache.
///
/// Los errores del producer se envuelven en `Arc` para entregar el mismo
/// error a todos los callers que esperaban el mismo calculo.
#[derive(Debug, Error)]
pub enum CacheError<E> {
    #[error("{0}")]
    Producer(Arc<E>),

    #[error("computation for '{key}' was aborted: {reason}")]
    Aborted { key: String, reason: String },

    #[error("no tokio runtime available to run the computation")]
    NoRuntime,
}

impl<E> CacheError<E> {
    /// Error del producer, si lo hay.
    pub fn producer_error(&self) -> Option<&E> {
        match self {
            Self::Producer(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl<E> Clone for CacheError<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Producer(e) => Self::Producer(Arc::clone(e)),
            Self::Aborted { key, reason } => Self::Aborted {
                key: key.clone(),
                reason: reason.clone(),
            },
            Self::NoRuntime => Self::NoRuntime,
        }
    }
}

/// Configuracion del cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL en segundos (default: 300 = 5 minutos, 0 = sin TTL)
    pub ttl_seconds: u64,
    /// Maximo numero de entries (default: 10000)
    pub max_capacity: u64,
    /// Time-to-idle en segundos (opcional)
    pub tti_seconds: Option<u64>,
    /// Shards de la tabla de calculos en curso (default: 16)
    pub in_flight_shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_capacity: 10_000,
            tti_seconds: None,
            in_flight_shards: 16,
        }
    }
}

/// Resultado de un producer: el valor y los tokens de los que depende.
///
/// La entry queda stale en cuanto cualquiera de los tokens se dispara.
#[derive(Debug, Clone)]
pub struct Computed<V> {
    pub value: V,
    pub dependencies: Vec<ChangeToken>,
}

impl<V> Computed<V> {
    /// Valor sin dependencias (solo expira por TTL o capacidad).
    pub fn new(value: V) -> Self {
        Self {
            value,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(value: V, dependencies: Vec<ChangeToken>) -> Self {
        Self {
            value,
            dependencies,
        }
    }

    /// Agrega una dependencia.
    pub fn depends_on(mut self, token: ChangeToken) -> Self {
        self.dependencies.push(token);
        self
    }
}

struct CacheEntry<V> {
    value: V,
    dependencies: Vec<ChangeToken>,
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self) -> bool {
        !self.dependencies.iter().any(ChangeToken::has_changed)
    }
}

type FlightFuture<V, E> = Shared<BoxFuture<'static, Result<V, CacheError<E>>>>;

struct InFlight<V, E> {
    id: u64,
    flight: FlightFuture<V, E>,
}

type FlightShard<V, E> = Mutex<HashMap<CacheKey, InFlight<V, E>>>;

/// Quita el marcador de calculo en curso al terminar la tarea, incluso si el
/// producer hace panic o la tarea se cancela.
struct FlightGuard<V, E> {
    shards: Arc<Vec<FlightShard<V, E>>>,
    shard: usize,
    key: CacheKey,
    id: u64,
}

impl<V, E> Drop for FlightGuard<V, E> {
    fn drop(&mut self) {
        let mut flights = self.shards[self.shard].lock();
        // Solo si el marcador sigue siendo el nuestro
        if flights.get(&self.key).is_some_and(|f| f.id == self.id) {
            flights.remove(&self.key);
        }
    }
}

/// Cache read-through con calculo single-flight.
///
/// Para una key dada hay como maximo un producer ejecutandose; los callers
/// concurrentes se unen a ese calculo y reciben el mismo valor o el mismo
/// error. El calculo corre en su propia tarea de tokio, asi que cancelar a
/// un caller no afecta a los demas ni impide que el resultado se guarde.
///
/// Las entries dependen de [`ChangeToken`]s: una entry con algun token
/// disparado se trata como ausente.
///
/// # Examples
///
/// ```no_run
/// use review_server::cache::{CacheConfig, CacheKey, CacheRegion, Computed, SingleFlightCache};
///
/// # #[tokio::main]
/// # async fn main() {
/// let region = CacheRegion::new("CustomerReview");
/// let cache: SingleFlightCache<u32, std::io::Error> =
///     SingleFlightCache::new("ratings", CacheConfig::default());
///
/// let key = CacheKey::builder("CustomerReview", "GetProductRating").part("p-1").build();
/// let token = region.create_change_token();
/// let value = cache
///     .get_or_compute(key, move || async move { Ok(Computed::new(4).depends_on(token)) })
///     .await
///     .unwrap();
/// assert_eq!(value, 4);
/// # }
/// ```
pub struct SingleFlightCache<V, E> {
    name: Arc<str>,
    entries: Cache<CacheKey, Arc<CacheEntry<V>>>,
    in_flight: Arc<Vec<FlightShard<V, E>>>,
    next_flight_id: Arc<AtomicU64>,
    metrics: CacheMetrics,
    runtime: Option<Handle>,
}

impl<V, E> Clone for SingleFlightCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            entries: self.entries.clone(),
            in_flight: Arc::clone(&self.in_flight),
            next_flight_id: Arc::clone(&self.next_flight_id),
            metrics: self.metrics.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<V, E> fmt::Debug for SingleFlightCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightCache")
            .field("name", &self.name)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl<V, E> SingleFlightCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: fmt::Display + Send + Sync + 'static,
{
    /// Crea un nuevo cache con la configuracion dada.
    ///
    /// Si se llama dentro de un runtime de tokio, se guarda su handle para
    /// las variantes bloqueantes.
    pub fn new(name: impl Into<String>, config: CacheConfig) -> Self {
        let name: String = name.into();
        let metrics = CacheMetrics::new(name.clone());

        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if config.ttl_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(config.ttl_seconds));
        }

        if let Some(tti) = config.tti_seconds {
            builder = builder.time_to_idle(Duration::from_secs(tti));
        }

        // Configurar listener para evictions
        let eviction_metrics = metrics.clone();
        builder = builder.eviction_listener(move |_key, _value, cause| {
            let reason = match cause {
                RemovalCause::Expired => "ttl",
                RemovalCause::Size => "capacity",
                RemovalCause::Explicit => "manual",
                RemovalCause::Replaced => "replaced",
            };
            eviction_metrics.record_eviction(reason);
        });

        let shards = (0..config.in_flight_shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();

        Self {
            name: Arc::from(name),
            entries: builder.build(),
            in_flight: Arc::new(shards),
            next_flight_id: Arc::new(AtomicU64::new(0)),
            metrics,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Fija el runtime usado por las variantes bloqueantes y para lanzar
    /// calculos fuera de un contexto de tokio.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Retorna el valor cacheado o lo calcula con `producer`.
    ///
    /// - Entry viva: se retorna sin llamar al producer.
    /// - Calculo en curso para la key: se espera ese calculo.
    /// - En otro caso este caller lanza el producer; el resultado se guarda
    ///   suscrito a sus dependencias y se entrega a todos los que esperaban.
    ///
    /// Un error del producer no se guarda: todos los que esperaban reciben
    /// el mismo error y la siguiente llamada vuelve a intentar.
    ///
    /// Keys no cacheables van directo al producer, sin compartir ni guardar.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, producer: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<V>, E>> + Send + 'static,
    {
        let start = Instant::now();

        if !key.is_cacheable() {
            self.metrics.record_bypass();
            let result = producer().await.map(|computed| computed.value).map_err(|e| {
                self.metrics.record_producer_failure();
                CacheError::Producer(Arc::new(e))
            });
            self.metrics
                .record_operation_duration("get_or_compute_bypass", start.elapsed());
            return result;
        }

        if let Some(value) = self.lookup(&key).await {
            self.metrics.record_hit();
            trace!(cache = %self.name, key = %key, "Cache hit");
            self.metrics
                .record_operation_duration("get_or_compute_hit", start.elapsed());
            return Ok(value);
        }

        let flight = self.join_or_start(key, producer)?;
        let result = flight.await;

        self.metrics
            .record_operation_duration("get_or_compute_miss", start.elapsed());
        result
    }

    /// Variante bloqueante de [`get_or_compute`](Self::get_or_compute).
    ///
    /// Usa el mismo calculo compartido que la variante async.
    ///
    /// # Panics
    ///
    /// Hace panic si se llama desde un hilo que esta ejecutando tareas
    /// async (usar `spawn_blocking` en ese caso).
    pub fn get_or_compute_blocking<F, Fut>(
        &self,
        key: CacheKey,
        producer: F,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<V>, E>> + Send + 'static,
    {
        let handle = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or(CacheError::NoRuntime)?;
        handle.block_on(self.get_or_compute(key, producer))
    }

    /// Obtiene un valor vivo del cache, sin calcular.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let value = self.lookup(key).await;
        if value.is_some() {
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }
        value
    }

    async fn lookup(&self, key: &CacheKey) -> Option<V> {
        let entry = self.entries.get(key).await?;
        if entry.is_live() {
            return Some(entry.value.clone());
        }

        self.metrics.record_stale();
        debug!(
            cache = %self.name,
            key = %key,
            age_ms = entry.created_at.elapsed().as_millis() as u64,
            "Discarding stale cache entry"
        );
        self.remove_if_same(key, &entry).await;
        None
    }

    /// Quita `stale` solo si sigue siendo la entrada guardada para `key`.
    ///
    /// Un calculo concurrente pudo reemplazarla por una fresca entre el
    /// `get` y este punto; esa no se toca.
    async fn remove_if_same(&self, key: &CacheKey, stale: &Arc<CacheEntry<V>>) {
        let _ = self
            .entries
            .entry(key.clone())
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if Arc::ptr_eq(current.value(), stale) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }

    fn shard_index(&self, key: &CacheKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.in_flight.len()
    }

    fn spawn_handle(&self) -> Result<Handle, CacheError<E>> {
        Handle::try_current()
            .ok()
            .or_else(|| self.runtime.clone())
            .ok_or(CacheError::NoRuntime)
    }

    fn join_or_start<F, Fut>(
        &self,
        key: CacheKey,
        producer: F,
    ) -> Result<FlightFuture<V, E>, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<V>, E>> + Send + 'static,
    {
        let shard = self.shard_index(&key);
        let mut flights = self.in_flight[shard].lock();

        if let Some(existing) = flights.get(&key) {
            self.metrics.record_join();
            trace!(cache = %self.name, key = %key, "Joining in-flight computation");
            return Ok(existing.flight.clone());
        }

        self.metrics.record_miss();
        let handle = self.spawn_handle()?;
        let id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);

        // El guard del task toma este mismo lock, asi que el marcador queda
        // insertado antes de que el task pueda quitarlo.
        let task = handle.spawn(self.clone().run_flight(key.clone(), shard, id, producer));

        let flight_key = key.to_string();
        let flight = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(CacheError::Aborted {
                    key: flight_key,
                    reason: e.to_string(),
                }),
            }
        }
        .boxed()
        .shared();

        flights.insert(
            key,
            InFlight {
                id,
                flight: flight.clone(),
            },
        );
        Ok(flight)
    }

    async fn run_flight<F, Fut>(
        self,
        key: CacheKey,
        shard: usize,
        id: u64,
        producer: F,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<V>, E>> + Send + 'static,
    {
        let _guard = FlightGuard {
            shards: Arc::clone(&self.in_flight),
            shard,
            key: key.clone(),
            id,
        };

        // Otro calculo pudo terminar entre nuestro miss y el lock
        if let Some(entry) = self.entries.get(&key).await {
            if entry.is_live() {
                return Ok(entry.value.clone());
            }
        }

        debug!(cache = %self.name, key = %key, "Cache miss, running producer");

        let computed = match producer().await {
            Ok(computed) => computed,
            Err(e) => {
                self.metrics.record_producer_failure();
                warn!(cache = %self.name, key = %key, error = %e, "Cache producer failed");
                return Err(CacheError::Producer(Arc::new(e)));
            },
        };

        // Un token disparado durante el calculo hace que el valor ya nazca
        // stale: se entrega pero no se guarda.
        if computed.dependencies.iter().any(ChangeToken::has_changed) {
            debug!(
                cache = %self.name,
                key = %key,
                "Dependency changed during computation, result not stored"
            );
        } else {
            let entry = CacheEntry {
                value: computed.value.clone(),
                dependencies: computed.dependencies,
                created_at: Instant::now(),
            };
            self.entries.insert(key, Arc::new(entry)).await;
            self.update_entry_gauge();
        }

        Ok(computed.value)
    }

    /// Invalida una entrada especifica.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key).await;
    }

    /// Invalida todas las entradas.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Retorna el numero aproximado de entries en cache.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Numero de calculos en curso.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Nombre del cache (etiqueta de metricas).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actualiza el gauge de entry count.
    fn update_entry_gauge(&self) {
        self.metrics.update_entry_count(self.entries.entry_count());
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Sincroniza el cache: aplica las tareas pendientes de Moka.
    /// Util en tests antes de consultar `entry_count`.
    pub async fn sync(&self) {
        self.entries.run_pending_tasks().await;
    }
}

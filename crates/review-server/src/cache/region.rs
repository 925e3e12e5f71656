//! Cache regions: named groups of change tokens.
//!
//! Una region agrupa las entradas de un dominio logico (por ejemplo
//! `CustomerReview`) bajo un token global, y opcionalmente bajo tokens por
//! dimension (un usuario, un producto). Invalidar la region o una dimension
//! dispara el token vigente y deja uno nuevo para los suscriptores futuros.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use super::token::ChangeToken;
use crate::metrics::cache::record_region_invalidation;

/// Tamaño del mapa de dimensiones a partir del cual se poda.
const MIN_PRUNE_THRESHOLD: usize = 64;

struct RegionState {
    global: ChangeToken,
    dimensions: HashMap<String, ChangeToken>,
    /// Se poda al llegar a este tamaño; despues pasa al doble de lo que quedo.
    prune_at: usize,
}

impl RegionState {
    /// Quita tokens que solo viven en el mapa (ninguna entrada ni calculo
    /// los retiene) o que ya se dispararon. Volver a pedirlos crea uno nuevo
    /// sin perder suscriptores.
    fn prune_dimensions(&mut self) {
        let before = self.dimensions.len();
        self.dimensions
            .retain(|_, token| token.is_shared() && !token.has_changed());
        self.prune_at = (self.dimensions.len() * 2).max(MIN_PRUNE_THRESHOLD);
        trace!(
            pruned = before - self.dimensions.len(),
            remaining = self.dimensions.len(),
            "Pruned unused dimension tokens"
        );
    }
}

/// Region de cache con un token global y tokens por dimension.
///
/// Creacion de tokens e invalidaciones se serializan con un `RwLock`, por lo
/// que son linearizables: un token obtenido despues de `invalidate` nunca es
/// el token que esa invalidacion disparo.
pub struct CacheRegion {
    name: String,
    state: RwLock<RegionState>,
}

impl CacheRegion {
    /// Crea una region vacia.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            state: RwLock::new(RegionState {
                global: ChangeToken::new(name.clone()),
                dimensions: HashMap::new(),
                prune_at: MIN_PRUNE_THRESHOLD,
            }),
            name,
        }
    }

    /// Nombre de la region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token global vigente.
    pub fn create_change_token(&self) -> ChangeToken {
        self.state.read().global.clone()
    }

    /// Token vigente para una dimension.
    ///
    /// El token resultante tambien queda stale cuando se invalida la region
    /// completa. El mapa no crece con cada usuario visto: los tokens que ya
    /// nadie retiene se podan al crear dimensiones nuevas.
    pub fn create_dimension_token(&self, dimension: &str) -> ChangeToken {
        {
            let state = self.state.read();
            if let Some(token) = state.dimensions.get(dimension) {
                if !token.has_changed() {
                    return token.clone();
                }
            }
        }

        let mut state = self.state.write();
        // Otro hilo pudo crearlo mientras esperabamos el write lock
        if let Some(token) = state.dimensions.get(dimension) {
            if !token.has_changed() {
                return token.clone();
            }
        }

        if state.dimensions.len() >= state.prune_at {
            state.prune_dimensions();
        }

        let token = state
            .global
            .child(format!("{}/{}", self.name, dimension));
        state
            .dimensions
            .insert(dimension.to_string(), token.clone());
        token
    }

    /// Invalida la region completa.
    ///
    /// Dispara el token global (y con el, todas las dimensiones) y lo
    /// reemplaza por uno nuevo.
    pub fn invalidate(&self) {
        let previous = {
            let mut state = self.state.write();
            state.dimensions.clear();
            state.prune_at = MIN_PRUNE_THRESHOLD;
            std::mem::replace(&mut state.global, ChangeToken::new(self.name.clone()))
        };
        previous.fire();

        record_region_invalidation(&self.name, "global");
        info!(region = %self.name, "Cache region invalidated");
    }

    /// Invalida una sola dimension.
    ///
    /// No afecta otras dimensiones ni el token global.
    pub fn invalidate_dimension(&self, dimension: &str) {
        let previous = self.state.write().dimensions.remove(dimension);

        match previous {
            Some(token) => {
                token.fire();
                info!(region = %self.name, dimension = %dimension, "Cache dimension invalidated");
            },
            None => {
                debug!(
                    region = %self.name,
                    dimension = %dimension,
                    "No live token for dimension, nothing to invalidate"
                );
            },
        }
        record_region_invalidation(&self.name, "dimension");
    }

    /// Numero de dimensiones con token vigente.
    pub fn dimension_count(&self) -> usize {
        self.state.read().dimensions.len()
    }
}

impl std::fmt::Debug for CacheRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegion")
            .field("name", &self.name)
            .field("dimensions", &self.dimension_count())
            .finish()
    }
}

/// Registro de regiones por nombre.
///
/// Se comparte por handle (`Arc`) entre el servicio, el watcher y los
/// handlers de invalidacion.
#[derive(Default)]
pub struct CacheRegions {
    regions: RwLock<HashMap<String, Arc<CacheRegion>>>,
}

impl CacheRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna la region con ese nombre, creandola si no existe.
    pub fn region(&self, name: &str) -> Arc<CacheRegion> {
        if let Some(region) = self.regions.read().get(name) {
            return Arc::clone(region);
        }

        let mut regions = self.regions.write();
        Arc::clone(
            regions
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(CacheRegion::new(name))),
        )
    }

    /// Nombres de las regiones registradas, ordenados.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.regions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invalida todas las regiones. Retorna cuantas se invalidaron.
    pub fn invalidate_all(&self) -> usize {
        let regions: Vec<Arc<CacheRegion>> = self.regions.read().values().cloned().collect();
        for region in &regions {
            region.invalidate();
        }
        regions.len()
    }
}

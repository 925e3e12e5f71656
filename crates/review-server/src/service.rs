//! Cached review client used by the HTTP handlers.
//!
//! Reads go through [`SingleFlightCache`] and subscribe to change tokens;
//! writes go straight to the remote API and fire the tokens they affect
//! before returning.

use std::future::Future;
use std::sync::Arc;

use review_api::{ReviewApi, ReviewApiError};
use review_core::{
    CustomerReview, CustomerReviewAssessmentCreateModel, CustomerReviewCreateModel,
    CustomerReviewUpdateModel, ProductId, ReviewError, ReviewId, ReviewPage, ReviewSearchCriteria,
    UserContext, UserId,
};
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use crate::cache::{
    CacheConfig, CacheError, CacheKey, CacheRegion, CacheRegions, Computed, SingleFlightCache,
};

/// Scope de las keys de este cliente.
pub const REVIEW_SCOPE: &str = "CustomerReview";
/// Region de las busquedas de reviews (dimension por usuario).
pub const REVIEW_REGION: &str = "CustomerReview";
/// Region del rating agregado (dimension por producto).
pub const RATING_REGION: &str = "ProductRating";
/// Region disparada por cambios hechos fuera de este gateway.
pub const UPSTREAM_REGION: &str = "ReviewApiChanges";

const SEARCH_OPERATION: &str = "SearchReviews";
const RATING_OPERATION: &str = "GetProductRating";

fn user_dimension(user_id: &UserId) -> String {
    format!("user:{user_id}")
}

fn product_dimension(product_id: &ProductId) -> String {
    format!("product:{product_id}")
}

fn into_review_error(err: CacheError<ReviewApiError>) -> ReviewError {
    match err {
        CacheError::Producer(e) => e.to_review_error(),
        other => ReviewError::internal(other.to_string()),
    }
}

fn validate_product_id(product_id: &ProductId) -> Result<(), ReviewError> {
    if product_id.as_str().trim().is_empty() {
        return Err(ReviewError::validation("productId", "cannot be empty"));
    }
    Ok(())
}

fn validate_review_id(review_id: &ReviewId) -> Result<(), ReviewError> {
    if review_id.as_str().trim().is_empty() {
        return Err(ReviewError::validation("reviewId", "cannot be empty"));
    }
    Ok(())
}

/// Marca las reviews escritas por quien consulta.
fn mark_current_user(items: &mut [CustomerReview], user_id: Option<&UserId>) {
    for review in items {
        let mine = match (user_id, review.created_by.as_deref()) {
            (Some(user), Some(author)) => user.as_str() == author,
            _ => false,
        };
        review.is_current_user_review = Some(mine);
    }
}

/// Cliente de reviews con cache read-through.
///
/// - `search_reviews` cachea por criterio canonico y usuario; depende del
///   token global de reviews, del token upstream y de la dimension del
///   usuario autenticado.
/// - `get_product_rating` cachea por producto; depende del token global de
///   reviews, del token upstream y de la dimension del producto en la
///   region de ratings.
/// - Las escrituras nunca se cachean ni se deduplican. Invalidan la
///   dimension del usuario (y la del producto si cambian el rating) antes
///   de retornar, incluso si el API remoto fallo.
#[derive(Clone)]
pub struct ReviewCacheClient {
    api: Arc<dyn ReviewApi>,
    regions: Arc<CacheRegions>,
    reviews: Arc<CacheRegion>,
    ratings: Arc<CacheRegion>,
    upstream: Arc<CacheRegion>,
    search_cache: SingleFlightCache<ReviewPage, ReviewApiError>,
    rating_cache: SingleFlightCache<Option<f64>, ReviewApiError>,
    runtime: Option<Handle>,
}

impl ReviewCacheClient {
    /// Creates a client over `api`, registering its regions in `regions`.
    pub fn new(api: Arc<dyn ReviewApi>, regions: Arc<CacheRegions>, config: CacheConfig) -> Self {
        let runtime = Handle::try_current().ok();
        Self {
            reviews: regions.region(REVIEW_REGION),
            ratings: regions.region(RATING_REGION),
            upstream: regions.region(UPSTREAM_REGION),
            search_cache: SingleFlightCache::new("review_search", config.clone()),
            rating_cache: SingleFlightCache::new("product_rating", config),
            api,
            regions,
            runtime,
        }
    }

    /// Fija el runtime usado por las variantes `*_blocking`.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.search_cache = self.search_cache.with_runtime(handle.clone());
        self.rating_cache = self.rating_cache.with_runtime(handle.clone());
        self.runtime = Some(handle);
        self
    }

    /// Busca reviews.
    ///
    /// # Errors
    ///
    /// `Validation` si el paginado es invalido; el error mapeado del API
    /// remoto si la busqueda falla.
    #[instrument(skip_all, fields(user = %user, page = criteria.page_number))]
    pub async fn search_reviews(
        &self,
        user: &UserContext,
        criteria: &ReviewSearchCriteria,
    ) -> Result<ReviewPage, ReviewError> {
        let criteria = criteria.canonical();
        criteria.validate()?;

        let user_id = user.user_id().cloned();
        let key = CacheKey::builder(REVIEW_SCOPE, SEARCH_OPERATION)
            .part(&criteria)
            .part(&user_id)
            .build();

        let api = Arc::clone(&self.api);
        let reviews = Arc::clone(&self.reviews);
        let upstream = Arc::clone(&self.upstream);

        self.search_cache
            .get_or_compute(key, move || async move {
                // Tokens tomados antes de llamar al API: una invalidacion
                // durante la llamada deja el resultado stale.
                let mut dependencies = vec![
                    reviews.create_change_token(),
                    upstream.create_change_token(),
                ];
                if let Some(user_id) = &user_id {
                    dependencies.push(reviews.create_dimension_token(&user_dimension(user_id)));
                }

                let result = api.search(&criteria).await?;
                let mut page = result.into_page(&criteria);
                mark_current_user(&mut page.items, user_id.as_ref());

                Ok(Computed::with_dependencies(page, dependencies))
            })
            .await
            .map_err(into_review_error)
    }

    /// Rating agregado de un producto; `None` si nadie lo califico.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn get_product_rating(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<f64>, ReviewError> {
        validate_product_id(product_id)?;

        let key = CacheKey::builder(REVIEW_SCOPE, RATING_OPERATION)
            .part(product_id)
            .build();

        let api = Arc::clone(&self.api);
        let reviews = Arc::clone(&self.reviews);
        let ratings = Arc::clone(&self.ratings);
        let upstream = Arc::clone(&self.upstream);
        let product_id = product_id.clone();

        self.rating_cache
            .get_or_compute(key, move || async move {
                let dependencies = vec![
                    reviews.create_change_token(),
                    upstream.create_change_token(),
                    ratings.create_dimension_token(&product_dimension(&product_id)),
                ];

                let rating = api.get_rating(&product_id).await?;
                Ok(Computed::with_dependencies(rating, dependencies))
            })
            .await
            .map_err(into_review_error)
    }

    /// Crea una review del usuario para el producto.
    #[instrument(skip_all, fields(user = %user, product_id = %product_id))]
    pub async fn create_review(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        model: &CustomerReviewCreateModel,
    ) -> Result<(), ReviewError> {
        validate_product_id(product_id)?;
        model.validate()?;

        let result = self.api.upsert(vec![model.to_request(product_id, user)]).await;
        self.invalidate_after_write(user, Some(product_id));
        result.map_err(ReviewError::from)
    }

    /// Edita una review existente.
    #[instrument(skip_all, fields(user = %user, product_id = %product_id, review_id = %review_id))]
    pub async fn update_review(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        review_id: &ReviewId,
        model: &CustomerReviewUpdateModel,
    ) -> Result<(), ReviewError> {
        validate_product_id(product_id)?;
        validate_review_id(review_id)?;
        model.validate()?;

        let request = model.to_request(product_id, review_id, user);
        let result = self.api.upsert(vec![request]).await;
        self.invalidate_after_write(user, Some(product_id));
        result.map_err(ReviewError::from)
    }

    /// Borra una review.
    #[instrument(skip_all, fields(user = %user, product_id = %product_id, review_id = %review_id))]
    pub async fn delete_review(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<(), ReviewError> {
        validate_product_id(product_id)?;
        validate_review_id(review_id)?;

        let result = self.api.delete(vec![review_id.clone()]).await;
        self.invalidate_after_write(user, Some(product_id));
        result.map_err(ReviewError::from)
    }

    /// Registra un like/dislike. No cambia el rating del producto.
    #[instrument(skip_all, fields(user = %user, review_id = %review_id))]
    pub async fn create_assessment(
        &self,
        user: &UserContext,
        review_id: &ReviewId,
        model: &CustomerReviewAssessmentCreateModel,
    ) -> Result<(), ReviewError> {
        validate_review_id(review_id)?;

        let result = self.api.add_assessment(review_id, model.to_request(user)).await;
        self.invalidate_after_write(user, None);
        result.map_err(ReviewError::from)
    }

    fn invalidate_after_write(&self, user: &UserContext, product_id: Option<&ProductId>) {
        if let Some(user_id) = user.user_id() {
            self.reviews.invalidate_dimension(&user_dimension(user_id));
        }
        if let Some(product_id) = product_id {
            self.ratings.invalidate_dimension(&product_dimension(product_id));
        }
        debug!(user = %user, "Write completed, affected tokens fired");
    }

    /// Invalida las busquedas de un usuario.
    pub fn invalidate_user(&self, user_id: &UserId) {
        self.reviews.invalidate_dimension(&user_dimension(user_id));
    }

    /// Invalida el rating de un producto.
    pub fn invalidate_product_rating(&self, product_id: &ProductId) {
        self.ratings.invalidate_dimension(&product_dimension(product_id));
    }

    /// Dispara el token de cambios upstream (webhook).
    pub fn invalidate_upstream(&self) {
        self.upstream.invalidate();
    }

    /// Invalida todas las regiones registradas. Retorna cuantas.
    pub fn invalidate_all(&self) -> usize {
        self.regions.invalidate_all()
    }

    /// Health check del API remoto.
    pub async fn check_upstream(&self) -> Result<(), ReviewError> {
        self.api.health_check().await.map_err(ReviewError::from)
    }

    /// Nombre del backend remoto.
    pub fn api_name(&self) -> &str {
        self.api.name()
    }

    pub fn regions(&self) -> &Arc<CacheRegions> {
        &self.regions
    }

    /// Region disparada por cambios upstream (la usa el watcher).
    pub fn upstream_region(&self) -> Arc<CacheRegion> {
        Arc::clone(&self.upstream)
    }

    pub fn search_cache(&self) -> &SingleFlightCache<ReviewPage, ReviewApiError> {
        &self.search_cache
    }

    pub fn rating_cache(&self) -> &SingleFlightCache<Option<f64>, ReviewApiError> {
        &self.rating_cache
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, ReviewError> {
        let handle = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or_else(|| ReviewError::internal("no tokio runtime available"))?;
        Ok(handle.block_on(future))
    }

    /// Variante bloqueante de [`search_reviews`](Self::search_reviews).
    ///
    /// No llamar desde un hilo del runtime (usar `spawn_blocking`).
    pub fn search_reviews_blocking(
        &self,
        user: &UserContext,
        criteria: &ReviewSearchCriteria,
    ) -> Result<ReviewPage, ReviewError> {
        self.block_on(self.search_reviews(user, criteria))?
    }

    pub fn get_product_rating_blocking(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<f64>, ReviewError> {
        self.block_on(self.get_product_rating(product_id))?
    }

    pub fn create_review_blocking(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        model: &CustomerReviewCreateModel,
    ) -> Result<(), ReviewError> {
        self.block_on(self.create_review(user, product_id, model))?
    }

    pub fn update_review_blocking(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        review_id: &ReviewId,
        model: &CustomerReviewUpdateModel,
    ) -> Result<(), ReviewError> {
        self.block_on(self.update_review(user, product_id, review_id, model))?
    }

    pub fn delete_review_blocking(
        &self,
        user: &UserContext,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<(), ReviewError> {
        self.block_on(self.delete_review(user, product_id, review_id))?
    }

    pub fn create_assessment_blocking(
        &self,
        user: &UserContext,
        review_id: &ReviewId,
        model: &CustomerReviewAssessmentCreateModel,
    ) -> Result<(), ReviewError> {
        self.block_on(self.create_assessment(user, review_id, model))?
    }
}

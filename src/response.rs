//! JSON envelopes for successful responses.

use axum::Json;
use serde::Serialize;

/// `{ "data": ... }`
#[derive(Serialize)]
pub struct Single<T> {
    pub data: T,
}

/// `{ "data": [...], "meta": { "count": n } }`
#[derive(Serialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub meta: ListingMeta,
}

#[derive(Serialize)]
pub struct ListingMeta {
    pub count: usize,
}

pub fn single<T: Serialize>(data: T) -> Json<Single<T>> {
    Json(Single { data })
}

pub fn listing<T: Serialize>(data: Vec<T>) -> Json<Listing<T>> {
    let count = data.len();
    Json(Listing {
        data,
        meta: ListingMeta { count },
    })
}

//! Currency API endpoints.

use api_types::currency::{CurrencyNew, CurrencyView};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState, user};

fn view(currency: &engine::Currency) -> CurrencyView {
    CurrencyView {
        id: currency.id,
        code: currency.code.clone(),
        name: currency.name.clone(),
        decimal_places: currency.decimal_places,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CurrencyView>>, ServerError> {
    let currencies = state.engine.list_currencies(&user.username).await?;
    Ok(Json(currencies.iter().map(view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CurrencyNew>,
) -> Result<(StatusCode, Json<CurrencyView>), ServerError> {
    let mut cmd = engine::CreateCurrencyCmd::new(&user.username, payload.code, payload.name);
    if let Some(places) = payload.decimal_places {
        cmd = cmd.decimal_places(places);
    }

    let created = state.engine.create_currency(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(&created))))
}

pub mod auth;
pub mod cars;
pub mod drivers;
pub mod health;
pub mod index;
pub mod manufacturers;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use sea_orm::sea_query::{BinOper, Expr, Func, IntoIden, SimpleExpr};

/// `302 Found` pointing at `location`.
pub fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Case-insensitive substring match of `table.column` against `needle`.
///
/// Both sides are folded by the database's `LOWER()`, so a term always
/// finds the value it was copied from. LIKE wildcards in the needle are
/// escaped so that `%` and `_` match literally.
pub fn icontains<T, C>(table: T, column: C, needle: &str) -> SimpleExpr
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    let pattern = format!("%{}%", escape_like(needle));
    let pattern = SimpleExpr::Binary(
        Box::new(Func::lower(Expr::val(pattern)).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant('\\'.into())),
    );
    SimpleExpr::Binary(
        Box::new(Func::lower(Expr::col((table, column))).into()),
        BinOper::Like,
        Box::new(pattern),
    )
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Normalize an optional search term: blank input means "no filter".
pub fn search_term(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
}

/// API clients for the service's external collaborators.
///
/// Submodules:
/// - `dataset` — bulk cruise-sailing dataset fetch, cache, and queries.
/// - `forecast` — short-range daily forecast with climate-normals backfill.

pub mod dataset;
pub mod forecast;

/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - auth: token enforcement, http: request-id / access log / body limit / timeout
 */
pub mod auth;
pub mod http;

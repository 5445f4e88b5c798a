/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → introspection → 拒否 or 通過)
 * - 通過時は introspection の結果 (claims) を request extensions に載せる
 * - 拒否時は 401 + WWW-Authenticate challenge
 */
pub mod challenge;
pub mod enforce;
pub mod header;

pub use challenge::{AuthorizationChallenge, ErrorCode, resource_metadata_url};
pub use enforce::{EnforcementConfig, Rejection, authorize};
pub use header::{HeaderError, parse_authorization_header};

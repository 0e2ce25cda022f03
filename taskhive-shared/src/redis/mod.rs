/// Redis integration
///
/// Redis backs the token revocation denylist (`revoked:<jti>` and
/// `revoked-session:<sid>` keys written with `SET ... EX` and probed with
/// `EXISTS`). Nothing else in TaskHive keeps state outside PostgreSQL.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let healthy = client.ping().await?;
/// println!("Redis healthy: {}", healthy);
/// # Ok(())
/// # }
/// ```

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};

use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub catalog_url: Option<String>,
    pub qr_secret: String,
    pub daily_guest_capacity: u32,
    pub enforce_daily_capacity: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_token = env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string());
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "partyhall.db".to_string()),
            catalog_url: env::var("CATALOG_URL").ok().filter(|v| !v.trim().is_empty()),
            qr_secret: env::var("QR_SECRET").unwrap_or_else(|_| admin_token.clone()),
            admin_token,
            daily_guest_capacity: env::var("DAILY_GUEST_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            enforce_daily_capacity: env::var("ENFORCE_DAILY_CAPACITY")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Daily guest limit to enforce at reservation time, if any.
    pub fn enforced_guest_limit(&self) -> Option<u32> {
        self.enforce_daily_capacity.then_some(self.daily_guest_capacity)
    }
}

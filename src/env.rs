use crate::period::Period;

lazy_static! {
    /// Postgres connection string.
    pub static ref DATABASE_URL: String =
        dotenvy::var("DATABASE_URL").expect("missing DATABASE_URL environment variable");

    /// Address the HTTP server binds to.
    pub static ref BIND_ADDR: String =
        dotenvy::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    /// Directory where uploaded resource files land.
    pub static ref UPLOAD_DIR: String =
        dotenvy::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

    /// Earliest offer period shown in the archive listing. Example: `2019-1`
    pub static ref ARCHIVES_START: Period = dotenvy::var("ARCHIVES_START")
        .unwrap_or_else(|_| "2019-1".to_string())
        .parse()
        .expect("invalid value for ARCHIVES_START");
}

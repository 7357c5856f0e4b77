use eyre::Result;

use crate::AppState;

impl AppState {
    /// Drops everything in the public schema.
    pub async fn reset(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query("DROP SCHEMA public CASCADE")
            .execute(&mut *transaction)
            .await?;
        sqlx::query("CREATE SCHEMA public")
            .execute(&mut *transaction)
            .await?;
        let _ = sqlx::query("GRANT ALL ON SCHEMA public TO postgres")
            .execute(&mut *transaction)
            .await; // ok if this fails
        sqlx::query("GRANT ALL ON SCHEMA public TO public")
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;
        Ok(())
    }

    /// Migrates the database to the latest schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

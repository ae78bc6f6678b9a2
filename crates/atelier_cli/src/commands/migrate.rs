use atelier::db;
use atelier::migration::{Migrator, MigratorTrait};
use console::style;

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?.len();
            if pending == 0 {
                println!("Schema is up to date.");
            } else {
                println!("Applying {pending} migration(s)...");
                Migrator::up(&db, None).await?;
                println!("{} Migrations applied.", style("✓").green());
            }
        }
        MigrateAction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("{} Rolled back the last migration.", style("✓").green());
        }
        MigrateAction::Status => {
            for migration in Migrator::get_applied_migrations(&db).await? {
                println!("  {} {}", style("applied").green(), migration.name());
            }
            for migration in Migrator::get_pending_migrations(&db).await? {
                println!("  {} {}", style("pending").yellow(), migration.name());
            }
        }
        MigrateAction::Fresh => {
            println!("Dropping the mirror and ledger tables and reapplying migrations...");
            Migrator::fresh(&db).await?;
            println!("{} Fresh schema in place.", style("✓").green());
        }
    }

    Ok(())
}

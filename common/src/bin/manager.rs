use clap::Parser;

mod cli {
    use clap::{Parser, Subcommand};

    #[derive(Parser)]
    #[command(
        name = "lots service manager",
        about = "Cli tool for managing state of the lots service including postgres schema and reference data"
    )]
    pub(crate) struct Args {
        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand)]
    pub(crate) enum Command {
        Postgres {
            #[clap(subcommand)]
            cmd: PostgresCommand,
        },
    }

    #[derive(Subcommand)]
    pub(crate) enum PostgresCommand {
        Migrate,
        RevertAll,
        Redo,
        /// Insert a brand and its models, existing rows are kept
        SeedBrand {
            brand: String,
            models: Vec<String>,
        },
    }
}

mod postgres {
    use common::config::Config;
    use common::persistence::migrations::PG_MIGRATIONS;
    use common::persistence::models::lots::{NewBrand, NewModel};
    use common::persistence::schema::{brands, models};
    use common::persistence::{PgPool, init_pg_pool};
    use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
    use diesel_async::pooled_connection::deadpool::Object;
    use diesel_async::{AsyncMigrationHarness, AsyncPgConnection, RunQueryDsl};
    use diesel_migrations::MigrationHarness;

    fn pool() -> PgPool {
        let config = Config::load().expect("failed to load config");
        init_pg_pool(&config.postgres).expect("failed to build pg pool")
    }

    async fn harness() -> AsyncMigrationHarness<Object<AsyncPgConnection>> {
        let conn = pool().get().await.expect("failed to get pg connection");
        AsyncMigrationHarness::new(conn)
    }

    pub(crate) async fn migrate() {
        println!("Running migrations");
        harness()
            .await
            .run_pending_migrations(PG_MIGRATIONS)
            .expect("failed to run migrations");
        println!("Database migrated")
    }

    pub(crate) async fn revert_all() {
        println!("Reverting all migrations");
        harness()
            .await
            .revert_all_migrations(PG_MIGRATIONS)
            .expect("failed to revert migrations");
        println!("Database reverted")
    }

    pub(crate) async fn redo() {
        println!("Redoing all migrations");
        let mut harness = harness().await;
        harness
            .revert_all_migrations(PG_MIGRATIONS)
            .expect("failed to revert migrations");
        harness
            .run_pending_migrations(PG_MIGRATIONS)
            .expect("failed to run migrations");
        println!("Database redone")
    }

    pub(crate) async fn seed_brand(brand: String, model_names: Vec<String>) {
        println!("Seeding brand `{brand}`");
        let mut conn = pool().get().await.expect("failed to get pg connection");
        let existing = brands::table
            .filter(brands::brand_name.eq(&brand))
            .select(brands::brand_id)
            .first::<i32>(&mut conn)
            .await
            .optional()
            .expect("failed to look up brand");
        let brand_id = match existing {
            Some(id) => id,
            None => diesel::insert_into(brands::table)
                .values(NewBrand {
                    brand_name: &brand,
                })
                .returning(brands::brand_id)
                .get_result::<i32>(&mut conn)
                .await
                .expect("failed to insert brand"),
        };

        let new_models = model_names
            .iter()
            .map(|model_name| NewModel {
                brand_id,
                model_name,
            })
            .collect::<Vec<_>>();
        let inserted = diesel::insert_into(models::table)
            .values(&new_models)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .expect("failed to insert models");
        println!("Brand `{brand}` seeded with `{inserted}` new models");
    }
}

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    match args.command {
        cli::Command::Postgres { cmd } => dispatch_postgres(cmd).await,
    }
}

async fn dispatch_postgres(cmd: cli::PostgresCommand) {
    match cmd {
        cli::PostgresCommand::Migrate => postgres::migrate().await,
        cli::PostgresCommand::RevertAll => postgres::revert_all().await,
        cli::PostgresCommand::Redo => postgres::redo().await,
        cli::PostgresCommand::SeedBrand { brand, models } => {
            postgres::seed_brand(brand, models).await
        }
    };
}

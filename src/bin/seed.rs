use chrono::Utc;
use gymfog_shop::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    models::{Role, json_list},
    services::auth_service::hash_password,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,gymfog_shop=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "owner@gymfog.dz".into());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "change-me".into());
    let admin_id = ensure_user(&orm, &email, &password, Role::SuperAdmin).await?;

    seed_categories(&orm).await?;
    seed_products(&orm).await?;

    tracing::info!(%admin_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        let mut active: UserActive = existing.into();
        active.role = Set(role.as_str().to_string());
        let user = active.update(orm).await?;
        tracing::info!(email, role = %role, "user already present, role refreshed");
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        full_name: Set(Some("GYM FOG".to_string())),
        phone_number: Set(None),
        role: Set(role.as_str().to_string()),
        era: Set(None),
        is_blocked: Set(false),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    tracing::info!(email, role = %role, "user created");
    Ok(user.id)
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let categories = [
        ("Gloves", "Boxing, MMA and grappling gloves"),
        ("Protection", "Shin guards, mouthguards and head gear"),
        ("Apparel", "Rash guards, shorts and hoodies"),
    ];

    for (title, description) in categories {
        let exists = Categories::find()
            .filter(CategoryCol::Title.eq(title))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        CategoryActive {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            image_url: Set(None),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    tracing::info!("seeded categories");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = [
        ("Pro Boxing Gloves 12oz", "Gloves", "Venum", 8_500_i64, 20, &["10oz", "12oz", "14oz"][..]),
        ("MMA Shin Guards", "Protection", "Fairtex", 6_200, 4, &["S", "M", "L"][..]),
        ("Rash Guard Long Sleeve", "Apparel", "GYM FOG", 3_900, 35, &["S", "M", "L", "XL"][..]),
        ("Gel Mouthguard", "Protection", "Shock Doctor", 1_200, 0, &[][..]),
    ];

    for (title, category, brand, price_dzd, stock, sizes) in products {
        let exists = Products::find()
            .filter(ProductCol::Title.eq(title))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let sizes: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
        ProductActive {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            image_urls: Set(json_list(&[])),
            category: Set(category.to_string()),
            price_dzd: Set(price_dzd),
            stock_quantity: Set(stock),
            brand: Set(Some(brand.to_string())),
            sizes: Set(json_list(&sizes)),
            colors: Set(json_list(&[])),
            weight: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    tracing::info!("seeded products");
    Ok(())
}

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    DbErr, EntityTrait, IntoActiveModel as _, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use agriguru_api_schema::{chat_messages, contract_applications, otp_codes, users};
use agriguru_domain::alert::AlertType;
use agriguru_domain::contract::{ContractId, ContractStatus};

use crate::domain::repository::{
    ChatMessageRepository, ContractRepository, OtpRepository, UserRepository,
};
use crate::domain::types::{
    AlertPreferences, ChatMessage, ContractApplication, NewContractApplication, OtpPurpose,
    OtpRecord, Profile, RecipientFilter, User, WhatsAppSettings,
};
use crate::error::ApiError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model).transpose()?)
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let crops = serde_json::to_value(&user.profile.crops).context("encode crops")?;
        let result = users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            full_name: Set(user.full_name.clone()),
            phone: Set(user.phone.clone()),
            is_active: Set(user.is_active),
            is_admin: Set(user.is_admin),
            email_verified: Set(user.email_verified),
            google_id: Set(user.google_id.clone()),
            profile_image: Set(user.profile_image.clone()),
            created_at: Set(user.created_at),
            last_login: Set(user.last_login),
            password_changed_at: Set(user.password_changed_at),
            farm_location: Set(user.profile.farm_location.clone()),
            farm_size: Set(user.profile.farm_size),
            crops: Set(crops),
            language_preference: Set(user.profile.language_preference.clone()),
            whatsapp_number: Set(user.whatsapp.number.clone()),
            whatsapp_enabled: Set(user.whatsapp.enabled),
            whatsapp_verified: Set(user.whatsapp.verified),
            alert_weather: Set(user.whatsapp.alert_preferences.weather),
            alert_market_prices: Set(user.whatsapp.alert_preferences.market_prices),
            alert_crop_diseases: Set(user.whatsapp.alert_preferences.crop_diseases),
            whatsapp_code: Set(user.whatsapp.verification_code.clone()),
            whatsapp_code_expires_at: Set(user.whatsapp.code_expires_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ApiError::AccountExists)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            last_login: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update last login")?;
        Ok(())
    }

    async fn link_google(&self, id: Uuid, google_id: &str) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            google_id: Set(Some(google_id.to_owned())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("link google account")?;
        Ok(())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(Some(password_hash.to_owned())),
            password_changed_at: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update password")?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: &Profile) -> Result<(), ApiError> {
        let crops = serde_json::to_value(&profile.crops).context("encode crops")?;
        users::ActiveModel {
            id: Set(id),
            farm_location: Set(profile.farm_location.clone()),
            farm_size: Set(profile.farm_size),
            crops: Set(crops),
            language_preference: Set(profile.language_preference.clone()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update profile")?;
        Ok(())
    }

    async fn update_whatsapp(
        &self,
        id: Uuid,
        settings: &WhatsAppSettings,
    ) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id),
            whatsapp_number: Set(settings.number.clone()),
            whatsapp_enabled: Set(settings.enabled),
            whatsapp_verified: Set(settings.verified),
            alert_weather: Set(settings.alert_preferences.weather),
            alert_market_prices: Set(settings.alert_preferences.market_prices),
            alert_crop_diseases: Set(settings.alert_preferences.crop_diseases),
            whatsapp_code: Set(settings.verification_code.clone()),
            whatsapp_code_expires_at: Set(settings.code_expires_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update whatsapp settings")?;
        Ok(())
    }

    async fn list_alert_recipients(
        &self,
        alert_type: AlertType,
        filter: &RecipientFilter,
    ) -> Result<Vec<User>, ApiError> {
        let mut query = users::Entity::find()
            .filter(users::Column::WhatsappVerified.eq(true))
            .filter(users::Column::WhatsappEnabled.eq(true))
            .filter(users::Column::WhatsappNumber.is_not_null());
        query = match alert_type {
            AlertType::Weather => query.filter(users::Column::AlertWeather.eq(true)),
            AlertType::MarketPrices => query.filter(users::Column::AlertMarketPrices.eq(true)),
            AlertType::CropDiseases => query.filter(users::Column::AlertCropDiseases.eq(true)),
            AlertType::Generic => query,
        };
        if let Some(location) = &filter.farm_location {
            query = query.filter(users::Column::FarmLocation.eq(location.as_str()));
        }
        if let Some(language) = &filter.language_preference {
            query = query.filter(users::Column::LanguagePreference.eq(language.as_str()));
        }
        let models = query
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list alert recipients")?;
        // crops live in a JSON column; the crop filter is applied here.
        let mut recipients = Vec::with_capacity(models.len());
        for model in models {
            let user = user_from_model(model)?;
            if filter.matches(&user.profile) {
                recipients.push(user);
            }
        }
        Ok(recipients)
    }

    async fn list_active(&self) -> Result<Vec<User>, ApiError> {
        let models = users::Entity::find()
            .filter(users::Column::IsActive.eq(true))
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await
            .context("list active users")?;
        Ok(models
            .into_iter()
            .map(user_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

fn user_from_model(model: users::Model) -> anyhow::Result<User> {
    let crops: Vec<String> = serde_json::from_value(model.crops).context("decode crops")?;
    Ok(User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        full_name: model.full_name,
        phone: model.phone,
        is_active: model.is_active,
        is_admin: model.is_admin,
        email_verified: model.email_verified,
        google_id: model.google_id,
        profile_image: model.profile_image,
        created_at: model.created_at,
        last_login: model.last_login,
        password_changed_at: model.password_changed_at,
        profile: Profile {
            farm_location: model.farm_location,
            farm_size: model.farm_size,
            crops,
            language_preference: model.language_preference,
        },
        whatsapp: WhatsAppSettings {
            number: model.whatsapp_number,
            enabled: model.whatsapp_enabled,
            verified: model.whatsapp_verified,
            alert_preferences: AlertPreferences {
                weather: model.alert_weather,
                market_prices: model.alert_market_prices,
                crop_diseases: model.alert_crop_diseases,
            },
            verification_code: model.whatsapp_code,
            code_expires_at: model.whatsapp_code_expires_at,
        },
    })
}

// ── OTP repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl OtpRepository for DbOtpRepository {
    async fn replace(&self, record: &OtpRecord) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    otp_codes::Entity::delete_many()
                        .filter(otp_codes::Column::Email.eq(record.email.as_str()))
                        .filter(otp_codes::Column::Purpose.eq(record.purpose.as_str()))
                        .exec(txn)
                        .await?;
                    otp_codes::ActiveModel {
                        id: Set(record.id),
                        email: Set(record.email),
                        code: Set(record.code),
                        purpose: Set(record.purpose.as_str().to_owned()),
                        created_at: Set(record.created_at),
                        expires_at: Set(record.expires_at),
                        used: Set(record.used),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .context("replace otp")?;
        Ok(())
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        let result = otp_codes::Entity::update_many()
            .col_expr(otp_codes::Column::Used, Expr::value(true))
            .filter(otp_codes::Column::Email.eq(email))
            .filter(otp_codes::Column::Code.eq(code))
            .filter(otp_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(otp_codes::Column::Used.eq(false))
            .filter(otp_codes::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("consume otp")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Chat message repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbChatMessageRepository {
    pub db: DatabaseConnection,
}

impl ChatMessageRepository for DbChatMessageRepository {
    async fn append(&self, message: &ChatMessage) -> Result<(), ApiError> {
        chat_messages::ActiveModel {
            id: Set(message.id),
            room: Set(message.room.clone()),
            username: Set(message.username.clone()),
            message: Set(message.message.clone()),
            image: Set(message.image.clone()),
            created_at: Set(message.created_at),
        }
        .insert(&self.db)
        .await
        .context("append chat message")?;
        Ok(())
    }

    async fn list_room(&self, room: &str, limit: u64) -> Result<Vec<ChatMessage>, ApiError> {
        let models = chat_messages::Entity::find()
            .filter(chat_messages::Column::Room.eq(room))
            .order_by_desc(chat_messages::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list chat messages")?;
        Ok(models
            .into_iter()
            .rev()
            .map(|m| ChatMessage {
                id: m.id,
                room: m.room,
                username: m.username,
                message: m.message,
                image: m.image,
                created_at: m.created_at,
            })
            .collect())
    }
}

// ── Contract repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbContractRepository {
    pub db: DatabaseConnection,
}

impl ContractRepository for DbContractRepository {
    async fn insert(&self, new: &NewContractApplication) -> Result<ContractApplication, ApiError> {
        let model = contract_applications::ActiveModel {
            id: NotSet,
            submitted_at: Set(new.submitted_at),
            status: Set(new.status.as_str().to_owned()),
            personal_info: Set(serde_json::to_value(&new.personal_info)
                .context("encode personal info")?),
            address: Set(serde_json::to_value(&new.address).context("encode address")?),
            land_details: Set(serde_json::to_value(&new.land_details)
                .context("encode land details")?),
            banking_details: Set(serde_json::to_value(&new.banking_details)
                .context("encode banking details")?),
            contract_terms: Set(serde_json::to_value(&new.contract_terms)
                .context("encode contract terms")?),
            land_area_satak: Set(new.land_details.land_area_satak),
            total_contract_value: Set(new.contract_terms.terms.total_contract_value),
            remarks: Set(None),
            last_updated: Set(None),
        }
        .insert(&self.db)
        .await
        .context("insert contract application")?;
        Ok(ContractApplication::from_new(ContractId(model.id), new.clone()))
    }

    async fn list(&self) -> Result<Vec<ContractApplication>, ApiError> {
        let models = contract_applications::Entity::find()
            .order_by_desc(contract_applications::Column::Id)
            .all(&self.db)
            .await
            .context("list contract applications")?;
        Ok(models
            .into_iter()
            .map(contract_from_model)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find(&self, id: ContractId) -> Result<Option<ContractApplication>, ApiError> {
        let model = contract_applications::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find contract application")?;
        Ok(model.map(contract_from_model).transpose()?)
    }

    async fn update_status(
        &self,
        id: ContractId,
        status: ContractStatus,
        remarks: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<ContractApplication>, ApiError> {
        let Some(model) = contract_applications::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find contract application")?
        else {
            return Ok(None);
        };
        let mut am = model.into_active_model();
        am.status = Set(status.as_str().to_owned());
        if let Some(remarks) = remarks {
            am.remarks = Set(Some(remarks.to_owned()));
        }
        am.last_updated = Set(Some(at));
        let updated = am
            .update(&self.db)
            .await
            .context("update contract status")?;
        Ok(Some(contract_from_model(updated)?))
    }
}

fn contract_from_model(model: contract_applications::Model) -> anyhow::Result<ContractApplication> {
    Ok(ContractApplication {
        id: ContractId(model.id),
        submitted_at: model.submitted_at,
        status: model
            .status
            .parse()
            .with_context(|| format!("contract {} has unknown status", model.id))?,
        personal_info: serde_json::from_value(model.personal_info)
            .context("decode personal info")?,
        address: serde_json::from_value(model.address).context("decode address")?,
        land_details: serde_json::from_value(model.land_details).context("decode land details")?,
        banking_details: serde_json::from_value(model.banking_details)
            .context("decode banking details")?,
        contract_terms: serde_json::from_value(model.contract_terms)
            .context("decode contract terms")?,
        remarks: model.remarks,
        last_updated: model.last_updated,
    })
}

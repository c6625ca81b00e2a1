//! CLI command implementations

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Input};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::{self, AuthContext, AuthToken, GuardState, HttpAuthApi, SessionResolver, User};
use crate::cli::{
    error, format_guard_state, info, print_parking_detail, print_parking_table, print_quote,
    print_routes_table, print_user_detail, spinner, success, warn, OutputFormat, ParkingAction,
    ParkingFields, ParkingUpdateFields, PlanAction,
};
use crate::config::{self, Config};
use crate::parking::{ParkingApi, ParkingForm};
use crate::plan::{PlanApi, SubscribeRequest};
use crate::storage;

/// Path checked before running partner-only commands
const PARKING_ROUTE: &str = "/parking";

/// Everything a command needs to talk to the backend as the current user
struct Session {
    config: Config,
    client: ApiClient,
    auth: AuthContext,
}

impl Session {
    fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let client = ApiClient::new(&config.api)?;
        let (tokens, users) = storage::open_stores(&config.storage);
        let api = Arc::new(HttpAuthApi::new(
            client.clone(),
            config.api.endpoints.clone(),
        ));
        let auth = AuthContext::new(SessionResolver::new(tokens, users, api));
        Ok(Self {
            config,
            client,
            auth,
        })
    }

    /// Resolve the session behind a spinner
    async fn resolve(&self) -> Option<User> {
        let pb = spinner("Checking session...");
        let user = self.auth.refresh().await;
        pb.finish_and_clear();
        user
    }

    /// Resolve the session and make sure the guard lets the user onto `path`
    async fn require_access(&self, path: &str) -> Result<(User, AuthToken)> {
        let user = self.resolve().await;
        match auth::decide(path, user.as_ref(), false) {
            GuardState::Allowed => {}
            GuardState::RedirectLogin { .. } => {
                bail!("Not logged in. Run 'parkgate login --phone <phone>' first")
            }
            GuardState::RedirectForbidden { .. } => {
                bail!("You don't have permission to access {}", path)
            }
            state => bail!("Unexpected guard decision: {}", state),
        }

        let user = user.context("Session resolved without a user")?;
        let token = self
            .auth
            .token()
            .await?
            .context("Session has no stored token")?;
        Ok((user, token))
    }

    fn parking(&self) -> ParkingApi {
        ParkingApi::new(self.client.clone(), self.config.api.endpoints.clone())
    }

    fn plans(&self) -> PlanApi {
        PlanApi::new(self.client.clone(), self.config.api.endpoints.clone())
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = config::load_config_from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config::loader::apply_env_overrides(&mut config);
            Ok(config)
        }
        None => Ok(config::load_config()?),
    }
}

/// Print a value in the requested structured format
fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Table => Ok(false),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
    }
}

/// Initialize a new parkgate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("parkgate.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created parkgate.toml");
    info("Set api.base_url and run 'parkgate login --phone <phone>' to sign in");

    Ok(())
}

/// Log in with phone and OTP
pub async fn login(config_path: Option<&Path>, phone: &str, otp: Option<String>) -> Result<()> {
    let session = Session::open(config_path)?;

    if let Some(user) = session.resolve().await {
        info(&format!("Already signed in as {}", user.display_name()));
        return Ok(());
    }

    let otp = match otp {
        Some(otp) => otp,
        None => {
            let message = session.auth.request_otp(phone).await?;
            info(&message);
            Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter the OTP")
                .interact_text()?
        }
    };

    let pb = spinner("Logging in...");
    let result = session.auth.login(phone, &otp).await;
    pb.finish_and_clear();

    match result {
        Ok(Some(user)) => {
            success(&format!("Signed in as {}", user.display_name()));
            Ok(())
        }
        Ok(None) => {
            error("Login succeeded but the session could not be verified");
            bail!("Session verification failed")
        }
        Err(e) => {
            error(&format!("Login failed: {}", e));
            Err(e.into())
        }
    }
}

/// Log out
pub async fn logout(config_path: Option<&Path>, local: bool) -> Result<()> {
    let session = Session::open(config_path)?;

    let pb = spinner("Logging out...");
    if local {
        session.auth.sign_out_locally().await;
    } else {
        session.auth.on_logout().await;
    }
    pb.finish_and_clear();

    success("Logged out");
    Ok(())
}

/// Show the current user
pub async fn whoami(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let session = Session::open(config_path)?;

    let Some(user) = session.resolve().await else {
        info("Not signed in. Run 'parkgate login --phone <phone>'");
        return Ok(());
    };

    if !print_structured(&user, format)? {
        print_user_detail(&user);
    }
    Ok(())
}

/// Show the guard decision for a path
pub async fn check(config_path: Option<&Path>, path: &str) -> Result<()> {
    let session = Session::open(config_path)?;
    let user = session.resolve().await;
    let state = session.auth.state();

    let decision = auth::decide(path, user.as_ref(), state.is_auth_loading);
    println!("{} {}", path, format_guard_state(&decision));
    Ok(())
}

/// List the route table
pub async fn routes() -> Result<()> {
    print_routes_table(auth::ROUTE_RULES);
    Ok(())
}

/// Parking lot commands
pub async fn parking(config_path: Option<&Path>, action: ParkingAction) -> Result<()> {
    let session = Session::open(config_path)?;
    let (user, token) = session.require_access(PARKING_ROUTE).await?;
    let api = session.parking();

    match action {
        ParkingAction::List { format } => {
            let lots = api.list_for_user(&token, &user.id).await?;
            if !print_structured(&lots, format)? {
                print_parking_table(&lots);
            }
        }
        ParkingAction::Show { id, format } => {
            let lot = api.get(&token, &id).await?;
            if !print_structured(&lot, format)? {
                print_parking_detail(&lot);
            }
        }
        ParkingAction::Add(fields) => {
            let form = new_parking_form(fields, &user);
            match api.add(&token, &form).await {
                Ok(lot) => success(&format!("Added parking lot: {}", lot.name)),
                Err(e) => {
                    error(&format!("Failed to add parking lot: {}", e));
                    return Err(e.into());
                }
            }
        }
        ParkingAction::Update { id, fields } => {
            let current = api.get(&token, &id).await?;
            let form = apply_update(ParkingForm::from(&current), fields);
            match api.update(&token, &id, &form).await {
                Ok(lot) => success(&format!("Updated parking lot: {}", lot.name)),
                Err(e) => {
                    error(&format!("Failed to update parking lot: {}", e));
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn new_parking_form(fields: ParkingFields, user: &User) -> ParkingForm {
    ParkingForm {
        name: fields.name,
        address: fields.address,
        city: fields.city,
        price: fields.price,
        pin_code: fields.pin_code,
        description: fields.description,
        features: fields.features,
        user_id: Some(user.id.clone()),
    }
}

fn apply_update(mut form: ParkingForm, fields: ParkingUpdateFields) -> ParkingForm {
    if let Some(name) = fields.name {
        form.name = name;
    }
    if let Some(address) = fields.address {
        form.address = address;
    }
    if let Some(city) = fields.city {
        form.city = city;
    }
    if let Some(price) = fields.price {
        form.price = price;
    }
    if let Some(pin_code) = fields.pin_code {
        form.pin_code = pin_code;
    }
    if let Some(description) = fields.description {
        form.description = description;
    }
    if let Some(features) = fields.features {
        form.features = features;
    }
    form
}

/// Plan commands
pub async fn plan(config_path: Option<&Path>, action: PlanAction) -> Result<()> {
    let session = Session::open(config_path)?;
    let (user, token) = session.require_access(PARKING_ROUTE).await?;
    let api = session.plans();
    let plan = api.current(&token).await?;

    match action {
        PlanAction::Quote { slots } => {
            let quote = plan.quote(slots)?;
            print_quote(&plan, &quote);
        }
        PlanAction::Subscribe { parking_id, slots } => {
            let quote = plan.quote(slots)?;
            let request = SubscribeRequest::new(slots, &parking_id, &user.id)?;
            let subscription = api.subscribe(&token, &request).await?;
            success(&format!(
                "Subscribed {} slots for ₹{} (subscription {})",
                slots, quote.discounted, subscription.id
            ));
        }
    }

    Ok(())
}

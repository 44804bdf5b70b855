//! The startup/authentication state machine (`spec.md` §4.3, SPEC_FULL.md
//! §4.3): `StartupMessage`, then whichever of cleartext/MD5/SCRAM-SHA-256
//! the server's `AuthenticationXXX` challenge calls for, through the final
//! `BackendKeyData`/`ReadyForQuery`.

use crate::connection::scram::ScramState;
use crate::connection::stream::PgStream;
use crate::error::{err_protocol, Error};
use crate::message::{
    md5_password, Authentication, BackendKeyData, BackendMessageFormat, Password, ReadyForQuery,
    SaslInitialResponse, SaslResponse, Startup,
};
use crate::options::PoolOptions;

/// Run the whole exchange on a freshly connected [`PgStream`], returning the
/// `(process_id, secret_key)` pair `CancelRequest` later needs.
pub(crate) async fn run(stream: &mut PgStream, options: &PoolOptions) -> Result<(i32, i32), Error> {
    stream.send_startup(&Startup { params: startup_params(options) }).await?;

    let mut authenticated = false;
    let mut process_id = 0;
    let mut secret_key = 0;
    let mut scram_state: Option<ScramState> = None;
    let mut scram_expected_signature: Option<Vec<u8>> = None;

    loop {
        let msg = stream.recv().await?;
        match msg.format {
            BackendMessageFormat::Authentication => match msg.decode::<Authentication>()? {
                Authentication::Ok => authenticated = true,

                Authentication::CleartextPassword => {
                    let password = options.password.as_deref().unwrap_or_default();
                    stream.queue(&Password(password.to_string()))?;
                    stream.flush().await?;
                }

                Authentication::Md5Password { salt } => {
                    let password = options.password.as_deref().unwrap_or_default();
                    let response = md5_password(&options.username, password, salt);
                    stream.queue(&Password(response))?;
                    stream.flush().await?;
                }

                Authentication::Sasl { mechanisms } => {
                    if !mechanisms.iter().any(|m| m == "SCRAM-SHA-256") {
                        return Err(err_protocol!(
                            "server only offers SASL mechanisms this crate doesn't support: {mechanisms:?}"
                        ));
                    }
                    let password = options.password.as_deref().unwrap_or_default();
                    let (state, client_first_message) = ScramState::start(password);
                    stream.queue(&SaslInitialResponse {
                        mechanism: "SCRAM-SHA-256",
                        data: &client_first_message,
                    })?;
                    stream.flush().await?;
                    scram_state = Some(state);
                }

                Authentication::SaslContinue { data } => {
                    let state = scram_state
                        .as_ref()
                        .ok_or_else(|| err_protocol!("AuthenticationSASLContinue without a SASL handshake in progress"))?;
                    let (client_final_message, expected_signature) = state.handle_server_first(&data)?;
                    stream.queue(&SaslResponse(&client_final_message))?;
                    stream.flush().await?;
                    scram_expected_signature = Some(expected_signature);
                }

                Authentication::SaslFinal { data } => {
                    let expected_signature = scram_expected_signature
                        .as_deref()
                        .ok_or_else(|| err_protocol!("AuthenticationSASLFinal before AuthenticationSASLContinue"))?;
                    ScramState::verify_server_final(&data, expected_signature)?;
                }
            },

            BackendMessageFormat::BackendKeyData => {
                let BackendKeyData { process_id: pid, secret_key: key } = msg.decode()?;
                process_id = pid;
                secret_key = key;
            }

            BackendMessageFormat::ErrorResponse => return Err(PgStream::to_postgres_error(msg)?),

            BackendMessageFormat::ReadyForQuery => {
                let ReadyForQuery { .. } = msg.decode()?;
                if !authenticated {
                    return Err(err_protocol!("ReadyForQuery arrived before authentication completed"));
                }
                return Ok((process_id, secret_key));
            }

            other => return Err(err_protocol!("unexpected message during startup: {other:?}")),
        }
    }
}

fn startup_params(options: &PoolOptions) -> Vec<(String, String)> {
    let mut params = vec![
        ("user".to_string(), options.username.clone()),
        ("database".to_string(), options.database.clone()),
        ("client_encoding".to_string(), "UTF8".to_string()),
        ("DateStyle".to_string(), "ISO, MDY".to_string()),
        ("TimeZone".to_string(), "UTC".to_string()),
    ];
    if let Some(application_name) = &options.application_name {
        params.push(("application_name".to_string(), application_name.clone()));
    }
    params
}

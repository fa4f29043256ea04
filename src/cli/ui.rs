use crate::prelude::Error;

pub fn confirm(force: bool, msg: &str) -> Result<bool, Error> {
    log::debug!("Showing confirmation to user (force={}): {}", force, msg);

    if force {
        return Ok(true);
    }

    match dialoguer::Confirm::new().with_prompt(msg).interact() {
        Ok(value) => {
            log::debug!("User responded: {}", value);
            Ok(value)
        }
        Err(err) => {
            log::error!("Unable to request confirmation: {:?}", err);
            Err(Error::CliUnableToRequestConfirmation)
        }
    }
}

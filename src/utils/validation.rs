use crate::error::SchedulerError;

/// Checks a student or submitter name: non-empty, single line, sane length.
pub fn validate_name(name: &str) -> Result<(), SchedulerError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(SchedulerError::Validation("Name is required".to_string()));
    }
    if name.len() > 100 {
        return Err(SchedulerError::Validation(
            "Name cannot be longer than 100 characters".to_string(),
        ));
    }
    if name.contains('\n') || name.contains('\r') {
        return Err(SchedulerError::Validation(
            "Name cannot contain line breaks".to_string(),
        ));
    }

    Ok(())
}

/// Checks the contact field from the booking form.
pub fn validate_contact(contact: &str) -> Result<(), SchedulerError> {
    let contact = contact.trim();

    if contact.is_empty() {
        return Err(SchedulerError::Validation(
            "Contact is required".to_string(),
        ));
    }
    if contact.len() > 100 {
        return Err(SchedulerError::Validation(
            "Contact cannot be longer than 100 characters".to_string(),
        ));
    }

    Ok(())
}

//! @title System controller
//! @version Mark 1
//! @description System management service
//! @contact.name Operations
//! @license.name MIT

mod amqp;
mod model;

use amqp::EmergencyCommand;

/// EmergencyButton asyncApi
/// @queue emergency
/// @summary initiates complete data destruction
/// @payload EmergencyCommand
/// @contentType application/json
/// @tags danger admin
#[allow(non_snake_case)]
pub fn EmergencyButton(command: EmergencyCommand) {
    let _ = command;
}

/// CancelButton asyncApi
/// @queue emergency
/// @operation subscribe
/// @summary aborts a pending destruction
/// @payload amqp::CancelCommand
#[allow(non_snake_case)]
pub fn CancelButton() {}

/// DeleteAllData asyncApi
/// @queue emergency
/// @header overwrite_count: description='how many times the data needs to be overwritten';type=integer;example=5;required=true;
/// @payload model::DeletionRequest
#[allow(non_snake_case)]
pub fn DeleteAllData() {}

/// Not exported: no marker on the first line.
/// @queue emergency
pub fn helper() {}

fn main() {}

pub mod allowed_ip;
pub mod allowed_user;
pub mod client;
pub mod permission;
pub mod token;

pub use allowed_ip::Entity as AllowedIp;
pub use allowed_user::Entity as AllowedUser;
pub use client::Entity as Client;
pub use permission::Entity as Permission;
pub use token::Entity as Token;

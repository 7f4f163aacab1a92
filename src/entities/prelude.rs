pub use super::chances::Entity as Chances;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::tasks::Entity as Tasks;
pub use super::user_game_stats::Entity as UserGameStats;
pub use super::users::Entity as Users;

mod applications_tests;
mod preview_tests;
mod reminders_tests;

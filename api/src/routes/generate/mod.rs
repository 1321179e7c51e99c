pub mod generate_dto;
pub mod generate_route;

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    Code,
    CreatedBy,
    CurrentRound,
    Status,
    StartedAt,
    EndedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SessionParticipants {
    Table,
    Id,
    SessionId,
    ParticipantId,
    JoinedAt,
}

#[derive(Iden)]
enum SessionCandidates {
    Table,
    Id,
    SessionId,
    CandidateId,
    Name,
    Category,
    Rating,
    Address,
    Position,
}

#[derive(Iden)]
enum RoundDecks {
    Table,
    Id,
    SessionId,
    RoundNumber,
    CandidateId,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum SessionVotes {
    Table,
    Id,
    SessionId,
    ParticipantId,
    CandidateId,
    RoundNumber,
    Direction,
    IsFinalVote,
    CreatedAt,
}

#[derive(Iden)]
enum SessionMatches {
    Table,
    Id,
    SessionId,
    CandidateId,
    RoundNumber,
    IsFinalChoice,
    CreatedAt,
    FinalizedAt,
}

fn session_fk(name: &str, from: impl IntoIden + 'static, col: impl IntoIden + 'static) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from, col)
        .to(Sessions::Table, Sessions::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // sessions
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sessions::Code)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Sessions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::CurrentRound)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string()
                            .not_null()
                            .default("LOBBY"),
                    )
                    .col(
                        ColumnDef::new(Sessions::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // session_participants
        manager
            .create_table(
                Table::create()
                    .table(SessionParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionParticipants::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(SessionParticipants::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionParticipants::ParticipantId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionParticipants::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut session_fk(
                        "fk_session_participants_session_id",
                        SessionParticipants::Table,
                        SessionParticipants::SessionId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_session_participants_session_participant")
                    .table(SessionParticipants::Table)
                    .col(SessionParticipants::SessionId)
                    .col(SessionParticipants::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // session_candidates
        manager
            .create_table(
                Table::create()
                    .table(SessionCandidates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionCandidates::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(SessionCandidates::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionCandidates::CandidateId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SessionCandidates::Name).string().not_null())
                    .col(ColumnDef::new(SessionCandidates::Category).string().null())
                    .col(ColumnDef::new(SessionCandidates::Rating).double().null())
                    .col(ColumnDef::new(SessionCandidates::Address).string().null())
                    .col(
                        ColumnDef::new(SessionCandidates::Position)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(&mut session_fk(
                        "fk_session_candidates_session_id",
                        SessionCandidates::Table,
                        SessionCandidates::SessionId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_session_candidates_session_candidate")
                    .table(SessionCandidates::Table)
                    .col(SessionCandidates::SessionId)
                    .col(SessionCandidates::CandidateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // round_decks
        manager
            .create_table(
                Table::create()
                    .table(RoundDecks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoundDecks::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(RoundDecks::SessionId).string().not_null())
                    .col(ColumnDef::new(RoundDecks::RoundNumber).integer().not_null())
                    .col(ColumnDef::new(RoundDecks::CandidateId).string().not_null())
                    .col(ColumnDef::new(RoundDecks::Position).integer().not_null())
                    .col(
                        ColumnDef::new(RoundDecks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut session_fk(
                        "fk_round_decks_session_id",
                        RoundDecks::Table,
                        RoundDecks::SessionId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_round_decks_session_round_candidate")
                    .table(RoundDecks::Table)
                    .col(RoundDecks::SessionId)
                    .col(RoundDecks::RoundNumber)
                    .col(RoundDecks::CandidateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // session_votes
        manager
            .create_table(
                Table::create()
                    .table(SessionVotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionVotes::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(SessionVotes::SessionId).string().not_null())
                    .col(
                        ColumnDef::new(SessionVotes::ParticipantId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SessionVotes::CandidateId).string().not_null())
                    .col(
                        ColumnDef::new(SessionVotes::RoundNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SessionVotes::Direction).string().not_null())
                    .col(
                        ColumnDef::new(SessionVotes::IsFinalVote)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SessionVotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut session_fk(
                        "fk_session_votes_session_id",
                        SessionVotes::Table,
                        SessionVotes::SessionId,
                    ))
                    .to_owned(),
            )
            .await?;

        // one vote per (participant, candidate, round)
        manager
            .create_index(
                Index::create()
                    .name("ux_session_votes_participant_candidate_round")
                    .table(SessionVotes::Table)
                    .col(SessionVotes::SessionId)
                    .col(SessionVotes::ParticipantId)
                    .col(SessionVotes::CandidateId)
                    .col(SessionVotes::RoundNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_session_votes_session_round")
                    .table(SessionVotes::Table)
                    .col(SessionVotes::SessionId)
                    .col(SessionVotes::RoundNumber)
                    .to_owned(),
            )
            .await?;

        // session_matches
        manager
            .create_table(
                Table::create()
                    .table(SessionMatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionMatches::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(SessionMatches::SessionId).string().not_null())
                    .col(
                        ColumnDef::new(SessionMatches::CandidateId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionMatches::RoundNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionMatches::IsFinalChoice)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SessionMatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionMatches::FinalizedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(&mut session_fk(
                        "fk_session_matches_session_id",
                        SessionMatches::Table,
                        SessionMatches::SessionId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_session_matches_session_candidate")
                    .table(SessionMatches::Table)
                    .col(SessionMatches::SessionId)
                    .col(SessionMatches::CandidateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one final choice per session. sea-query has no partial index
        // builder that works on both backends, so this one is raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_session_matches_final_choice \
                 ON session_matches (session_id) WHERE is_final_choice",
            )
            .await?;

        // At most one final-vote accept per participant and round.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_session_votes_final_accept \
                 ON session_votes (session_id, participant_id, round_number) \
                 WHERE is_final_vote AND direction = 'accept'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse order; indexes go with their tables
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS ux_session_matches_final_choice")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS ux_session_votes_final_accept")
            .await?;

        for stmt in [
            Table::drop().table(SessionMatches::Table).if_exists().to_owned(),
            Table::drop().table(SessionVotes::Table).if_exists().to_owned(),
            Table::drop().table(RoundDecks::Table).if_exists().to_owned(),
            Table::drop().table(SessionCandidates::Table).if_exists().to_owned(),
            Table::drop().table(SessionParticipants::Table).if_exists().to_owned(),
            Table::drop().table(Sessions::Table).if_exists().to_owned(),
        ] {
            manager.drop_table(stmt).await?;
        }

        Ok(())
    }
}

/*!

This is the long-form manual for `attendee_selection` and `eventraffle`.

## The workflow

A session goes through five steps, always in the same order:

1. **Upload**: the organizer attaches the sign-up file (required) and the historical
   database (optional). Both must be declared as `text/csv`. The contents of the files are
   not read: the session works on the student database it was started with.
2. **Config**: the event name (not empty) and the capacity (a positive integer).
3. **Database**: the student database, with a search box matching names, emails and classes.
4. **Selection**: the draw. It can be run again; every run replaces the previous one.
5. **Results**: the statistics and the exports.

A reset brings the session back to the first step with the initial database.

## The draw

Only the students who answered `yes` (in any case) take part. Their order is shuffled with a
Fisher-Yates shuffle and the first `capacity` of them are selected. If there are fewer
eligible students than places, everybody is selected.

With `--mode priority`, the shuffled students are then sorted by their history: fewer events
attended first, then fewer absences, then fewer late arrivals, then the oldest last
attendance (students who never attended come first). Students with the same history keep
their shuffled order.

With `--seed`, the draws are reproducible: the same seed, roster and capacity always give the
same selection.

## Exports

| file | content |
|------|---------|
| `<event>_selected_attendees.csv` | the selected students, in draw order |
| `<event>_all_eligible.csv` | all the students who answered yes, in roster order |
| `<event>_ranking.csv` | the eligible students in draw order (the waitlist order) with their rank and a `selected` column |
| `updated_student_database.csv` | the whole roster, the selected students having attended the event |

`<event>` is the event name with the spaces replaced by underscores.

The tables use the roster fields as columns:

```text
user_id,name,email,class,num_events_attended,num_absences,num_late_arrivals,last_attended_date,events_attended,response
001,Alice Johnson,alice@university.edu,Computer Science,3,1,0,2024-01-15,"Tech Talk 2023, Workshop 2024, Networking Event",yes
```

Fields with commas, quotes or line breaks are quoted and inner quotes are doubled.

## Configuration

`eventraffle` accepts a configuration file in JSON:

```json
{
  "event": { "name": "Spring Gala", "capacity": 2, "date": "2024-05-04" },
  "signupFile": "signups.csv",
  "historicalFile": "history.csv",
  "rosterFile": "roster.json",
  "outputDirectory": "out",
  "randomSeed": 42,
  "selectionMode": "uniform",
  "adjustments": { "004": { "absent": true } }
}
```

All the fields but `event` are optional. Paths are relative to the configuration file.
Command line flags take precedence over the file.

The roster file is a JSON array of students:

```json
[
  {
    "user_id": "001",
    "name": "Alice Johnson",
    "email": "alice@university.edu",
    "class": "Computer Science",
    "num_events_attended": 3,
    "num_absences": 1,
    "num_late_arrivals": 0,
    "last_attended_date": "2024-01-15",
    "events_attended": ["Tech Talk 2023"],
    "response": "yes"
  }
]
```

 */

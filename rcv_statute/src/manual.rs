/*!

This is the long-form manual for `rcv_statute` and `mainercv`.

## Ballot corrections

Each ballot has five ranks. Before any counting, the ranks are corrected once,
following section 4.2.B of the Maine rules for ranked-choice tabulation.
The ranks are read from the first to the last:

- **Overvote**: when more than one candidate is marked at a rank, this rank and
  all the following ones are ignored.
- **Two skipped ranks**: when a rank is blank and the next one is blank too
  (or the blank rank is the last one), this rank and all the following ones are
  ignored.
- **One skipped rank**: a single blank rank followed by a choice is removed and
  the following choices move up by one rank.
- **Repeated candidate**: a candidate ranked a second time is removed at this
  rank and the following choices move up by one rank.

Overvotes are checked first: a ballot starting with an overvote is exhausted,
whatever comes after it.

|  ballot                                     | corrected        |
|---------------------------------------------|------------------|
| `A`, `B`, `A`, (blank), (blank)             | `A`, `B`         |
| `A`, `undervote`, `B`, (blank), (blank)     | `A`, `B`         |
| `A`, `undervote`, `undervote`, (blank), (blank) | `A`          |
| `A`, `overvote`, `B`, (blank), (blank)      | `A`              |

Content that is neither a declared candidate, nor `overvote` or `undervote`
is treated as blank.

## Rounds

Only the candidates ranked first on at least one corrected ballot take part in
the first round. Every round:

1. Each ballot counts for the candidate at its active rank. Exhausted ballots
   do not count, and are not part of the total used for the percentages.
2. A candidate with more than 50% of the continuing ballots is elected.
3. If only two candidates are left with exactly 50% each, the winner is drawn
   at random between them.
4. Otherwise, the candidate with the fewest votes is eliminated. If several
   candidates share the fewest votes, the eliminated one is drawn at random among them.
5. Ballots counting for the eliminated candidate move to their next rank naming a
   candidate still in the race, or become exhausted when there is none.

Exactly one candidate is eliminated per round, so there are never more rounds
than candidates.

## Random draws

The draws use a generator seeded by the user (`--seed`, or `randomSeed` in the
configuration). Every draw is reported with the round, the tied candidates and
the selected one. Running again with the same ballots and the same seed gives
the same outcome.

## Input files

`mainercv` reads cast vote records (CVR) in Excel (`.xlsx`) or CSV format.
Without a configuration file, the eight files published for the 2018 election of
the 2nd congressional district are read from the data directory:

```text
NOV18CVRExportFINAL1.xlsx  NOV18CVRExportFINAL2.xlsx  NOV18CVRExportFINAL3.xlsx
UOCAVA-FINALRepCD2.xlsx    UOCAVA-AUX-CVRRepCD2.xlsx  UOCAVA2CVRRepCD2.xlsx
AUXCVRProofedCVR95RepCD2.xlsx  RepCD2-8final.xlsx
```

The columns are found by the name in the first row:

| column                                     | content          |
|--------------------------------------------|------------------|
| `Cast Vote Record`                         | ballot id        |
| `Precinct`                                 | precinct         |
| `Ballot Style`                             | ballot style     |
| `Rep. to Congress 1st Choice District 2`   | first choice     |
| ...                                        | ...              |
| `Rep. to Congress 5th Choice District 2`   | fifth choice     |

Candidate names are cleaned up: surrounding spaces are removed, and a trailing
code in parentheses is dropped (`Golden, Jared F. (13380)` becomes
`Golden, Jared F.`).

A file that cannot be read is skipped with a warning, unless `--strict` is passed.

## Configuration

A JSON file can describe other contests:

```json
{
  "outputSettings": {
    "contestName": "Rep. to Congress District 2",
    "contestDate": "2018-11-06",
    "contestJurisdiction": "Maine",
    "contestOffice": "Representative to Congress"
  },
  "candidates": ["Golden, Jared F.", "Poliquin, Bruce L."],
  "rules": { "randomSeed": "2018" },
  "cvrFileSources": [
    { "filePath": "cvr1.xlsx", "provider": "xlsx", "excelWorksheetName": "Sheet1" },
    {
      "filePath": "cvr2.csv",
      "idColumn": "Cast Vote Record",
      "precinctColumn": "Precinct",
      "ballotStyleColumn": "Ballot Style",
      "choiceColumns": ["1st", "2nd", "3rd", "4th", "5th"],
      "overvoteLabel": "overvote",
      "undervoteLabel": "undervote"
    }
  ]
}
```

All the fields are optional. When `candidates` is missing, the candidates are
taken from the ballots. When `provider` is missing, it is deduced from the file
extension. The columns and labels default to the layout of the Maine exports.
A missing id, precinct or ballot style column is ignored with a warning; a
missing choice column makes the file unreadable.

## Output

With `--out`, a JSON summary is written: the contest, the winner, the seed,
the number of ballots, the digest of the corrected ballots, the random draws and,
for each round, the tally, the percentages and the transfers. With `--reference`,
this summary is compared with a previous one and any difference is reported.
With `--normalized`, the corrected ballots are written to a CSV file.

 */
